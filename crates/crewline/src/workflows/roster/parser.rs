use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::workflows::requests::domain::{ShiftType, UserId};

/// One usable roster row. `shift` is `None` when the cell was blank, which
/// the importer treats as "leave the existing slot alone".
#[derive(Debug)]
pub(crate) struct RosterRecord {
    pub(crate) user: UserId,
    pub(crate) date: NaiveDate,
    pub(crate) shift: Option<ShiftType>,
}

/// A row the parser could not turn into a record.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RowIssue {
    BlankUser,
    BadDate(String),
    UnknownShift(String),
}

pub(crate) fn parse_records<R: Read>(
    reader: R,
) -> Result<(Vec<RosterRecord>, Vec<RowIssue>), csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut issues = Vec::new();

    for row in csv_reader.deserialize::<RosterRow>() {
        let row = row?;
        let user = clean(&row.user);
        if user.is_empty() {
            issues.push(RowIssue::BlankUser);
            continue;
        }

        let date = match parse_date(&row.date) {
            Some(date) => date,
            None => {
                issues.push(RowIssue::BadDate(row.date));
                continue;
            }
        };

        let shift = match row.shift.as_deref() {
            None => None,
            Some(token) => match ShiftType::from_token(token) {
                Some(shift) => Some(shift),
                None => {
                    issues.push(RowIssue::UnknownShift(token.to_string()));
                    continue;
                }
            },
        };

        records.push(RosterRecord {
            user: UserId(user),
            date,
            shift,
        });
    }

    Ok((records, issues))
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    user: String,
    date: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    shift: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Strip BOM/zero-width characters spreadsheets like to sneak in.
fn clean(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

#[cfg(test)]
pub(crate) fn parse_date_for_tests(value: &str) -> Option<NaiveDate> {
    parse_date(value)
}
