use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Weekday};

use moveline_core::domain::session::ExtractionTier;
use moveline_core::script::states::{FieldRequest, MenuKind, MenuSelection};

use crate::nlu::{self, NluClient};

/// Tagged extraction result. The degraded paths stay visible to callers and
/// tests instead of collapsing into a bare Option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extraction {
    Parsed { value: String, confidence: u8 },
    Fallback { value: String },
    Failed,
}

impl Extraction {
    pub fn into_value(self) -> Option<(String, ExtractionTier, u8)> {
        match self {
            Self::Parsed { value, confidence } => {
                let tier =
                    if confidence >= RULES_CONFIDENCE { ExtractionTier::Rules } else { ExtractionTier::Nlu };
                Some((value, tier, confidence))
            }
            Self::Fallback { value } => Some((value, ExtractionTier::Fallback, FALLBACK_CONFIDENCE)),
            Self::Failed => None,
        }
    }
}

const RULES_CONFIDENCE: u8 = 95;
const NLU_CONFIDENCE: u8 = 80;
const FALLBACK_CONFIDENCE: u8 = 40;

/// Deterministic digit/keyword matching for closed-choice stages. Menu input
/// never touches the NLU service.
pub fn match_menu(kind: MenuKind, raw: &str) -> Option<MenuSelection> {
    let text = normalize(raw);
    if text.is_empty() {
        return None;
    }

    match kind {
        MenuKind::MainMenu => {
            if text == "1" || contains_any(&text, &["quote", "estimate", "price"]) {
                Some(MenuSelection::MainMenuQuote)
            } else if text == "2" || contains_any(&text, &["link", "text me", "online"]) {
                Some(MenuSelection::MainMenuBookingLink)
            } else if text == "0"
                || contains_any(&text, &["operator", "agent", "representative", "human", "person"])
            {
                Some(MenuSelection::MainMenuOperator)
            } else {
                None
            }
        }
        MenuKind::ServiceType => {
            if text == "1" || text.contains("full") {
                Some(MenuSelection::ServiceFull)
            } else if text == "2" || text.contains("labor") || text.contains("load") {
                Some(MenuSelection::ServiceLabor)
            } else {
                None
            }
        }
        MenuKind::HomeType => {
            if text == "1" || text.contains("house") || text.contains("home") {
                Some(MenuSelection::HomeHouse)
            } else if text == "2" || contains_any(&text, &["apartment", "apt", "condo", "unit"]) {
                Some(MenuSelection::HomeApartment)
            } else if text == "3" || text.contains("storage") {
                Some(MenuSelection::HomeStorage)
            } else {
                None
            }
        }
        MenuKind::YesNo => {
            if text == "1" || contains_any(&text, &["yes", "yeah", "yep", "correct", "sure"]) {
                Some(MenuSelection::Yes)
            } else if text == "2" || contains_any(&text, &["no", "nope", "none"]) {
                Some(MenuSelection::No)
            } else {
                None
            }
        }
        MenuKind::Decision => {
            if contains_any(&text, &["start over", "restart", "change"]) || text == "3" {
                Some(MenuSelection::DecisionRestart)
            } else if text == "0"
                || contains_any(&text, &["operator", "agent", "transfer", "human"])
            {
                Some(MenuSelection::DecisionTransfer)
            } else if text == "2" || text.contains("email") || text.contains("send") {
                Some(MenuSelection::DecisionEmail)
            } else if text == "1" || contains_any(&text, &["book", "schedule", "yes"]) {
                Some(MenuSelection::DecisionBook)
            } else {
                None
            }
        }
        MenuKind::SlotChoice => {
            if text == "1" || text.contains("morning") || text.contains("8") {
                Some(MenuSelection::SlotMorning)
            } else if text == "2" || text.contains("afternoon") || text.contains("1 pm") {
                Some(MenuSelection::SlotAfternoon)
            } else {
                None
            }
        }
    }
}

/// Field extractor: deterministic rules first, the NLU call for free text,
/// and a heuristic fallback so a live call always gets a next prompt.
pub struct FieldExtractor {
    nlu: Arc<dyn NluClient>,
    timeout: Duration,
}

impl FieldExtractor {
    pub fn new(nlu: Arc<dyn NluClient>, timeout: Duration) -> Self {
        Self { nlu, timeout }
    }

    pub async fn extract(&self, request: FieldRequest, raw: &str, today: NaiveDate) -> Extraction {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Extraction::Failed;
        }

        if let Some(value) = rule_extract(request, trimmed, today) {
            return Extraction::Parsed { value, confidence: RULES_CONFIDENCE };
        }

        if needs_nlu(request) {
            match nlu::extract_value(self.nlu.as_ref(), request, trimmed, self.timeout).await {
                Ok(value) => {
                    if let Some(value) = validate_nlu_value(request, &value, today) {
                        return Extraction::Parsed { value, confidence: NLU_CONFIDENCE };
                    }
                }
                Err(error) => {
                    tracing::debug!(
                        event_name = "extract.nlu.degraded",
                        field = ?request,
                        error = %error,
                        "nlu extraction failed; using deterministic fallback"
                    );
                }
            }
        }

        match fallback_extract(request, trimmed, today) {
            Some(value) => Extraction::Fallback { value },
            None => Extraction::Failed,
        }
    }
}

fn needs_nlu(request: FieldRequest) -> bool {
    matches!(
        request,
        FieldRequest::Address | FieldRequest::PersonName | FieldRequest::Email | FieldRequest::MoveDate
    )
}

/// High-confidence deterministic parses that skip the NLU round trip.
fn rule_extract(request: FieldRequest, raw: &str, today: NaiveDate) -> Option<String> {
    match request {
        FieldRequest::Bedrooms => parse_bedrooms(raw).map(|count| count.to_string()),
        FieldRequest::MoveDate => parse_literal_date(raw, today).map(iso),
        FieldRequest::Email => {
            let text = normalize(raw);
            looks_like_email(&text).then_some(text)
        }
        FieldRequest::FreeText => Some(raw.trim().to_owned()),
        FieldRequest::Address | FieldRequest::PersonName => None,
    }
}

/// Best-effort heuristics used when the NLU call fails or returns garbage.
/// Never panics; `None` means the turn should re-prompt.
fn fallback_extract(request: FieldRequest, raw: &str, today: NaiveDate) -> Option<String> {
    match request {
        FieldRequest::Address | FieldRequest::FreeText => Some(raw.trim().to_owned()),
        FieldRequest::PersonName => Some(title_case(raw)),
        FieldRequest::Email => {
            let text = spoken_email(raw);
            looks_like_email(&text).then_some(text)
        }
        FieldRequest::MoveDate => parse_move_date(raw, today).map(iso),
        FieldRequest::Bedrooms => parse_bedrooms(raw).map(|count| count.to_string()),
    }
}

fn validate_nlu_value(request: FieldRequest, value: &str, today: NaiveDate) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match request {
        FieldRequest::Email => {
            let text = normalize(trimmed);
            looks_like_email(&text).then_some(text)
        }
        FieldRequest::MoveDate => parse_move_date(trimmed, today).map(iso),
        _ => Some(trimmed.to_owned()),
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_ascii_lowercase()
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn looks_like_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !text.contains(' ') && !domain.starts_with('.')
}

/// Literal "at"/"dot" substitution for emails read out loud.
fn spoken_email(raw: &str) -> String {
    let mut parts = Vec::new();
    for token in normalize(raw).split_whitespace() {
        match token {
            "at" => parts.push("@".to_owned()),
            "dot" => parts.push(".".to_owned()),
            other => parts.push(other.trim_matches(|ch: char| ch == ',').to_owned()),
        }
    }
    parts.concat()
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_bedrooms(raw: &str) -> Option<u32> {
    let text = normalize(raw);
    if contains_any(&text, &["studio", "zero"]) {
        return Some(0);
    }
    for token in text.split_whitespace() {
        if let Ok(count) = token.parse::<u32>() {
            if count <= 20 {
                return Some(count);
            }
        }
        if let Some(count) = word_number(token) {
            return Some(count);
        }
    }
    None
}

fn word_number(token: &str) -> Option<u32> {
    match token {
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        _ => None,
    }
}

/// Unambiguous formats only (ISO and m/d); spoken forms go through
/// `parse_move_date`.
fn parse_literal_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%m/%d/%Y", "%m/%d/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    if let Some((month, day)) = text.split_once('/') {
        if let (Ok(month), Ok(day)) = (month.parse::<u32>(), day.parse::<u32>()) {
            return next_occurrence(today, month, day);
        }
    }
    None
}

pub(crate) fn parse_move_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(date) = parse_literal_date(raw, today) {
        return Some(date);
    }

    let text = normalize(raw);
    if text.contains("today") {
        return Some(today);
    }
    if text.contains("tomorrow") {
        return Some(today + chrono::Duration::days(1));
    }
    if let Some(weekday) = parse_weekday(&text) {
        return Some(next_weekday(today, weekday));
    }

    let tokens: Vec<&str> = text
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();
    let month = tokens.iter().find_map(|token| month_number(token))?;
    let day = tokens.iter().find_map(|token| {
        let digits: String = token.chars().take_while(|ch| ch.is_ascii_digit()).collect();
        digits.parse::<u32>().ok().filter(|day| (1..=31).contains(day))
    });
    let day = day.or_else(|| tokens.iter().find_map(|token| ordinal_day(token)))?;

    let year = tokens.iter().find_map(|token| {
        token.parse::<i32>().ok().filter(|year| (2000..=2100).contains(year))
    });
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => next_occurrence(today, month, day),
    }
}

fn next_occurrence(today: NaiveDate, month: u32, day: u32) -> Option<NaiveDate> {
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
    match this_year {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}

fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let mut date = today + chrono::Duration::days(1);
    while date.weekday() != weekday {
        date += chrono::Duration::days(1);
    }
    date
}

fn parse_weekday(text: &str) -> Option<Weekday> {
    [
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sunday", Weekday::Sun),
    ]
    .into_iter()
    .find(|(name, _)| text.contains(name))
    .map(|(_, weekday)| weekday)
}

fn month_number(token: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    if token.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|month| month.starts_with(token) || token.starts_with(month))
        .map(|index| index as u32 + 1)
}

fn ordinal_day(token: &str) -> Option<u32> {
    let ordinals = [
        ("first", 1),
        ("second", 2),
        ("third", 3),
        ("fourth", 4),
        ("fifth", 5),
        ("tenth", 10),
        ("twelfth", 12),
        ("fifteenth", 15),
        ("twentieth", 20),
    ];
    ordinals.iter().find(|(name, _)| token == *name).map(|(_, day)| *day)
}
