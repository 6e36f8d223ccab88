use crate::error::JournalError;
use crate::journal::date_key::DateKey;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named category of daily journaling, each with its own ledger and archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Gratitude,
    EveningReview,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Gratitude, Domain::EveningReview];

    pub fn storage_prefix(self) -> &'static str {
        match self {
            Self::Gratitude => "gratitude",
            Self::EveningReview => "evening_review",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Gratitude => "gratitude",
            Self::EveningReview => "evening-review",
        }
    }

    pub fn ledger_key(self) -> String {
        format!("{}_entries", self.storage_prefix())
    }

    pub fn archive_key(self) -> String {
        format!("saved_{}_entries", self.storage_prefix())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Domain {
    type Err = JournalError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "gratitude" => Ok(Self::Gratitude),
            "evening-review" | "review" => Ok(Self::EveningReview),
            _ => Err(JournalError::UnknownDomain(raw.to_string())),
        }
    }
}

/// Static description of one practice domain: its ledger payload, its
/// archive content, and how the two relate.
pub trait Practice: Send + Sync + 'static {
    const DOMAIN: Domain;

    type Payload: Serialize + DeserializeOwned + Clone + Default + PartialEq + fmt::Debug + Send + Sync;
    type Content: Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync;

    /// Applied to every payload before it is stored.
    fn normalize(payload: Self::Payload) -> Self::Payload {
        payload
    }

    fn derive_payload(content: &Self::Content) -> Self::Payload;

    /// The per-day count metric shown in weekly progress.
    fn count(payload: &Self::Payload) -> usize;

    /// Item-list domains treat an empty payload as "no entry".
    fn is_blank(_payload: &Self::Payload) -> bool {
        false
    }

    /// Named boolean facets tallied by insights.
    fn facets(_payload: &Self::Payload) -> Vec<(&'static str, bool)> {
        Vec::new()
    }

    fn share_text(date: DateKey, content: &Self::Content) -> String;
}

/// Payloads made of an ordered list of short strings.
pub trait ItemList {
    fn items(&self) -> &[String];
    fn items_mut(&mut self) -> &mut Vec<String>;
}

fn drop_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct Gratitude;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GratitudePayload {
    pub items: Vec<String>,
}

impl ItemList for GratitudePayload {
    fn items(&self) -> &[String] {
        &self.items
    }

    fn items_mut(&mut self) -> &mut Vec<String> {
        &mut self.items
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GratitudeContent {
    pub items: Vec<String>,
}

impl Practice for Gratitude {
    const DOMAIN: Domain = Domain::Gratitude;

    type Payload = GratitudePayload;
    type Content = GratitudeContent;

    fn normalize(payload: GratitudePayload) -> GratitudePayload {
        GratitudePayload {
            items: drop_blank(payload.items),
        }
    }

    fn derive_payload(content: &GratitudeContent) -> GratitudePayload {
        GratitudePayload {
            items: drop_blank(content.items.clone()),
        }
    }

    fn count(payload: &GratitudePayload) -> usize {
        payload.items.len()
    }

    fn is_blank(payload: &GratitudePayload) -> bool {
        payload.items.is_empty()
    }

    fn share_text(_date: DateKey, content: &GratitudeContent) -> String {
        let mut out = String::from("Today I'm grateful for:");
        for item in content.items.iter().filter(|i| !i.trim().is_empty()) {
            out.push('\n');
            out.push_str(item);
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EveningReview;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewAnswers {
    pub resentful: bool,
    pub selfish: bool,
    pub fearful: bool,
    pub apology: bool,
    pub kindness: bool,
    pub spiritual: bool,
    pub aa_talk: bool,
    pub prayer_meditation: bool,
}

impl ReviewAnswers {
    pub const NAMES: [&'static str; 8] = [
        "resentful",
        "selfish",
        "fearful",
        "apology",
        "kindness",
        "spiritual",
        "aaTalk",
        "prayerMeditation",
    ];

    pub fn pairs(&self) -> [(&'static str, bool); 8] {
        [
            ("resentful", self.resentful),
            ("selfish", self.selfish),
            ("fearful", self.fearful),
            ("apology", self.apology),
            ("kindness", self.kindness),
            ("spiritual", self.spiritual),
            ("aaTalk", self.aa_talk),
            ("prayerMeditation", self.prayer_meditation),
        ]
    }

    pub fn yes_count(&self) -> usize {
        self.pairs().iter().filter(|(_, yes)| *yes).count()
    }

    /// Builds answers from the names of the questions answered "yes".
    /// Names match case-insensitively and ignore `-`/`_`.
    pub fn from_yes_names<S: AsRef<str>>(names: &[S]) -> anyhow::Result<Self> {
        let mut out = Self::default();
        for raw in names {
            let norm: String = raw
                .as_ref()
                .trim()
                .chars()
                .filter(|c| *c != '-' && *c != '_')
                .collect::<String>()
                .to_ascii_lowercase();
            match norm.as_str() {
                "" => {}
                "resentful" => out.resentful = true,
                "selfish" => out.selfish = true,
                "fearful" => out.fearful = true,
                "apology" => out.apology = true,
                "kindness" => out.kindness = true,
                "spiritual" => out.spiritual = true,
                "aatalk" => out.aa_talk = true,
                "prayermeditation" => out.prayer_meditation = true,
                _ => anyhow::bail!(
                    "unknown review answer `{}` (expected one of {})",
                    raw.as_ref(),
                    Self::NAMES.join(", ")
                ),
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flag {
    #[serde(rename = "yes")]
    Yes,
    #[serde(rename = "no")]
    No,
    #[default]
    #[serde(rename = "")]
    Unanswered,
}

impl Flag {
    pub fn is_yes(self) -> bool {
        matches!(self, Flag::Yes)
    }
}

/// Full nightly review as captured on the review screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailedReview {
    pub resentful_flag: Flag,
    pub resentful_note: String,
    pub selfish_flag: Flag,
    pub selfish_note: String,
    pub fearful_flag: Flag,
    pub fearful_note: String,
    pub apology_flag: Flag,
    pub apology_name: String,
    pub kindness_flag: Flag,
    pub kindness_note: String,
    pub spiritual_flag: String,
    pub spiritual_note: String,
    pub prayer_meditation_flag: Flag,
    pub stayed_sober: bool,
    pub prayed_or_meditated: bool,
    pub practiced_gratitude: bool,
    #[serde(rename = "readAALiterature")]
    pub read_aa_literature: bool,
    pub talked_to_alcoholic: bool,
    pub did_something_for_others: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_resentful: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_apology: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_shared: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_others: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_well: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_better: Option<String>,
}

fn flag_line(out: &mut Vec<String>, question: &str, flag: Flag, note: &str) {
    let answer = match flag {
        Flag::Unanswered => return,
        Flag::Yes => "Yes",
        Flag::No => "No",
    };
    if flag.is_yes() && !note.trim().is_empty() {
        out.push(format!("{question} {answer} - {note}"));
    } else {
        out.push(format!("{question} {answer}"));
    }
}

impl Practice for EveningReview {
    const DOMAIN: Domain = Domain::EveningReview;

    type Payload = ReviewAnswers;
    type Content = DetailedReview;

    fn derive_payload(d: &DetailedReview) -> ReviewAnswers {
        ReviewAnswers {
            resentful: d.stayed_sober || d.resentful_flag.is_yes(),
            selfish: d.prayed_or_meditated || d.selfish_flag.is_yes(),
            fearful: d.practiced_gratitude || d.fearful_flag.is_yes(),
            apology: d.read_aa_literature || d.apology_flag.is_yes(),
            kindness: d.talked_to_alcoholic || d.kindness_flag.is_yes(),
            spiritual: d.did_something_for_others || !d.spiritual_flag.is_empty(),
            aa_talk: false,
            prayer_meditation: d.prayed_or_meditated || d.prayer_meditation_flag.is_yes(),
        }
    }

    fn count(payload: &ReviewAnswers) -> usize {
        payload.yes_count()
    }

    fn facets(payload: &ReviewAnswers) -> Vec<(&'static str, bool)> {
        payload.pairs().to_vec()
    }

    fn share_text(date: DateKey, d: &DetailedReview) -> String {
        let mut answered = Vec::new();
        flag_line(&mut answered, "1. Was I resentful today?", d.resentful_flag, &d.resentful_note);
        flag_line(
            &mut answered,
            "2. Was I selfish and self-centered today?",
            d.selfish_flag,
            &d.selfish_note,
        );
        flag_line(
            &mut answered,
            "3. Was I fearful or worrisome today?",
            d.fearful_flag,
            &d.fearful_note,
        );
        flag_line(
            &mut answered,
            "4. Do I owe anyone an apology?",
            d.apology_flag,
            &d.apology_name,
        );
        flag_line(
            &mut answered,
            "5. Was I of service or kind to others today?",
            d.kindness_flag,
            &d.kindness_note,
        );
        flag_line(
            &mut answered,
            "6. Did I pray or meditate today?",
            d.prayer_meditation_flag,
            "",
        );
        if !d.spiritual_note.trim().is_empty() {
            answered.push(format!(
                "7. How was my spiritual condition today? {}",
                d.spiritual_note
            ));
        }

        let mut out = format!("{}\n\nEvening Review\n\n", date.long_display());
        if !answered.is_empty() {
            out.push_str(&answered.join("\n\n"));
            out.push_str("\n\n");
        }
        out.push_str("Working my program one day at a time.");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keys_follow_domain_prefix() {
        assert_eq!(Domain::Gratitude.ledger_key(), "gratitude_entries");
        assert_eq!(Domain::Gratitude.archive_key(), "saved_gratitude_entries");
        assert_eq!(Domain::EveningReview.ledger_key(), "evening_review_entries");
        assert_eq!(
            Domain::EveningReview.archive_key(),
            "saved_evening_review_entries"
        );
    }

    #[test]
    fn domain_parses_cli_spellings() {
        assert_eq!("gratitude".parse::<Domain>().expect("domain"), Domain::Gratitude);
        assert_eq!("evening_review".parse::<Domain>().expect("domain"), Domain::EveningReview);
        assert_eq!("Review".parse::<Domain>().expect("domain"), Domain::EveningReview);
        assert!("journal".parse::<Domain>().is_err());
    }

    #[test]
    fn gratitude_normalize_drops_blank_items() {
        let payload = Gratitude::normalize(GratitudePayload {
            items: vec!["sun".into(), "  ".into(), "".into(), "friends".into()],
        });
        assert_eq!(payload.items, vec!["sun", "friends"]);
        assert_eq!(Gratitude::count(&payload), 2);
    }

    #[test]
    fn review_derivation_follows_practice_booleans_and_flags() {
        let detailed = DetailedReview {
            stayed_sober: true,
            kindness_flag: Flag::Yes,
            spiritual_flag: "good".into(),
            fearful_flag: Flag::No,
            ..DetailedReview::default()
        };
        let answers = EveningReview::derive_payload(&detailed);
        assert!(answers.resentful);
        assert!(answers.kindness);
        assert!(answers.spiritual);
        assert!(!answers.fearful);
        assert!(!answers.aa_talk);
        assert_eq!(EveningReview::count(&answers), 3);
    }

    #[test]
    fn review_answers_parse_from_names() {
        let answers =
            ReviewAnswers::from_yes_names(&["kindness", "aa-talk", "PrayerMeditation"]).expect("parse");
        assert!(answers.kindness && answers.aa_talk && answers.prayer_meditation);
        assert_eq!(answers.yes_count(), 3);
        assert!(ReviewAnswers::from_yes_names(&["sleepy"]).is_err());
    }

    #[test]
    fn detailed_review_reads_camel_case_storage() {
        let raw = r#"{"resentfulFlag":"yes","resentfulNote":"boss","readAALiterature":true,"spiritualFlag":""}"#;
        let detailed: DetailedReview = serde_json::from_str(raw).expect("parse");
        assert_eq!(detailed.resentful_flag, Flag::Yes);
        assert!(detailed.read_aa_literature);
        assert_eq!(detailed.selfish_flag, Flag::Unanswered);
    }

    #[test]
    fn review_share_text_lists_answered_questions() {
        let detailed = DetailedReview {
            resentful_flag: Flag::Yes,
            resentful_note: "traffic".into(),
            selfish_flag: Flag::No,
            spiritual_note: "calm".into(),
            ..DetailedReview::default()
        };
        let date = DateKey::parse("2024-03-01").expect("date");
        let text = EveningReview::share_text(date, &detailed);
        assert!(text.starts_with("Friday, March 1, 2024\n\nEvening Review\n\n"));
        assert!(text.contains("1. Was I resentful today? Yes - traffic"));
        assert!(text.contains("2. Was I selfish and self-centered today? No"));
        assert!(!text.contains("3. Was I fearful"));
        assert!(text.contains("7. How was my spiritual condition today? calm"));
        assert!(text.ends_with("Working my program one day at a time."));
    }

    #[test]
    fn gratitude_share_text_lists_items() {
        let date = DateKey::parse("2024-03-01").expect("date");
        let content = GratitudeContent {
            items: vec!["coffee".into(), "my sponsor".into()],
        };
        assert_eq!(
            Gratitude::share_text(date, &content),
            "Today I'm grateful for:\ncoffee\nmy sponsor"
        );
    }
}
