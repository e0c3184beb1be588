//! Parsing and validation of OAI-PMH request arguments.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

use super::resumption;
use crate::error::{OaiError, Result};
use crate::provider::ListQuery;
use crate::types::MetadataPrefix;

/// Datestamp pattern at the repository's day granularity.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// The six OAI-PMH verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Identify,
    GetRecord,
    ListIdentifiers,
    ListMetadataFormats,
    ListRecords,
    ListSets,
}

impl Verb {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identify => "Identify",
            Self::GetRecord => "GetRecord",
            Self::ListIdentifiers => "ListIdentifiers",
            Self::ListMetadataFormats => "ListMetadataFormats",
            Self::ListRecords => "ListRecords",
            Self::ListSets => "ListSets",
        }
    }

    /// Arguments the verb accepts besides `verb` itself.
    fn allowed_arguments(&self) -> &'static [&'static str] {
        match self {
            Self::Identify => &[],
            Self::GetRecord => &["identifier", "metadataPrefix"],
            Self::ListMetadataFormats => &["identifier"],
            Self::ListIdentifiers | Self::ListRecords => {
                &["metadataPrefix", "from", "until", "set", "resumptionToken"]
            }
            Self::ListSets => &["resumptionToken"],
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = OaiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Identify" => Ok(Self::Identify),
            "GetRecord" => Ok(Self::GetRecord),
            "ListIdentifiers" => Ok(Self::ListIdentifiers),
            "ListMetadataFormats" => Ok(Self::ListMetadataFormats),
            "ListRecords" => Ok(Self::ListRecords),
            "ListSets" => Ok(Self::ListSets),
            other => Err(OaiError::BadVerb(other.to_string())),
        }
    }
}

/// Selective-harvesting arguments of ListIdentifiers/ListRecords, plus the
/// position reached by earlier pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub prefix: MetadataPrefix,
    pub set: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub offset: usize,
}

impl Selection {
    #[must_use]
    pub fn new(prefix: MetadataPrefix) -> Self {
        Self {
            prefix,
            set: None,
            from: None,
            until: None,
            offset: 0,
        }
    }

    /// Provider query for the whole selection; paging happens afterwards.
    #[must_use]
    pub fn to_list_query(&self) -> ListQuery {
        ListQuery {
            prefix: self.prefix,
            set: self.set.clone(),
            cursor: None,
            from: self.from,
            until: self.until,
            batch_size: None,
        }
    }
}

/// A validated OAI-PMH request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OaiRequest {
    Identify,
    ListMetadataFormats { identifier: Option<String> },
    GetRecord {
        identifier: String,
        prefix: MetadataPrefix,
    },
    ListIdentifiers(Selection),
    ListRecords(Selection),
    ListSets { offset: usize },
}

impl OaiRequest {
    #[must_use]
    pub fn verb(&self) -> Verb {
        match self {
            Self::Identify => Verb::Identify,
            Self::ListMetadataFormats { .. } => Verb::ListMetadataFormats,
            Self::GetRecord { .. } => Verb::GetRecord,
            Self::ListIdentifiers(_) => Verb::ListIdentifiers,
            Self::ListRecords(_) => Verb::ListRecords,
            Self::ListSets { .. } => Verb::ListSets,
        }
    }

    /// Validate the raw query or form arguments of a request.
    ///
    /// # Examples
    /// ```
    /// use catalog_oaipmh::protocol::{OaiRequest, Verb};
    ///
    /// let params = vec![("verb".to_string(), "Identify".to_string())];
    /// let request = OaiRequest::from_params(&params).unwrap();
    /// assert_eq!(request.verb(), Verb::Identify);
    /// ```
    pub fn from_params(params: &[(String, String)]) -> Result<Self> {
        let mut verbs = params.iter().filter(|(k, _)| k == "verb").map(|(_, v)| v);
        let verb: Verb = match (verbs.next(), verbs.next()) {
            (None, _) => return Err(OaiError::BadVerb("missing verb argument".into())),
            (Some(_), Some(_)) => return Err(OaiError::BadVerb("verb argument is repeated".into())),
            (Some(v), None) => v.parse()?,
        };

        let mut args: BTreeMap<&str, &str> = BTreeMap::new();
        for (key, value) in params.iter().filter(|(k, _)| k != "verb") {
            if !verb.allowed_arguments().contains(&key.as_str()) {
                return Err(OaiError::BadArgument(format!(
                    "Illegal argument '{key}' for verb {verb}"
                )));
            }
            if args.insert(key.as_str(), value.as_str()).is_some() {
                return Err(OaiError::BadArgument(format!("Argument '{key}' is repeated")));
            }
        }

        if let Some(token) = args.get("resumptionToken") {
            if args.len() > 1 {
                return Err(OaiError::BadArgument(
                    "resumptionToken is an exclusive argument".into(),
                ));
            }
            return match verb {
                Verb::ListSets => Ok(Self::ListSets {
                    offset: resumption::decode_sets(token)?,
                }),
                Verb::ListIdentifiers => Ok(Self::ListIdentifiers(resumption::decode_selection(
                    verb, token,
                )?)),
                Verb::ListRecords => Ok(Self::ListRecords(resumption::decode_selection(verb, token)?)),
                other => Err(OaiError::BadArgument(format!(
                    "Verb {other} does not take a resumptionToken"
                ))),
            };
        }

        match verb {
            Verb::Identify => Ok(Self::Identify),
            Verb::ListSets => Ok(Self::ListSets { offset: 0 }),
            Verb::ListMetadataFormats => Ok(Self::ListMetadataFormats {
                identifier: args.get("identifier").map(|s| s.to_string()),
            }),
            Verb::GetRecord => {
                let identifier = required(&args, "identifier", verb)?;
                let prefix = required(&args, "metadataPrefix", verb)?.parse()?;
                Ok(Self::GetRecord {
                    identifier: identifier.to_string(),
                    prefix,
                })
            }
            Verb::ListIdentifiers | Verb::ListRecords => {
                let prefix = required(&args, "metadataPrefix", verb)?.parse()?;
                let from = args
                    .get("from")
                    .map(|v| parse_datestamp(v, Bound::From))
                    .transpose()?;
                let until = args
                    .get("until")
                    .map(|v| parse_datestamp(v, Bound::Until))
                    .transpose()?;

                if let (Some(from), Some(until)) = (from, until) {
                    if from > until {
                        return Err(OaiError::BadArgument(
                            "'from' must not be later than 'until'".into(),
                        ));
                    }
                }

                let selection = Selection {
                    prefix,
                    set: args.get("set").map(|s| s.to_string()),
                    from,
                    until,
                    offset: 0,
                };
                Ok(if verb == Verb::ListIdentifiers {
                    Self::ListIdentifiers(selection)
                } else {
                    Self::ListRecords(selection)
                })
            }
        }
    }
}

fn required<'a>(args: &BTreeMap<&str, &'a str>, name: &str, verb: Verb) -> Result<&'a str> {
    args.get(name)
        .copied()
        .ok_or_else(|| OaiError::BadArgument(format!("Missing required argument '{name}' for verb {verb}")))
}

/// Which end of a date range a datestamp bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    From,
    Until,
}

/// Parse a day-granularity datestamp.
///
/// `from` starts at the beginning of the day, `until` covers the whole day.
///
/// # Examples
/// ```
/// use catalog_oaipmh::protocol::{parse_datestamp, Bound};
///
/// let until = parse_datestamp("2020-01-31", Bound::Until).unwrap();
/// assert_eq!(until.to_rfc3339(), "2020-01-31T23:59:59.999999999+00:00");
/// assert!(parse_datestamp("2020-01-31T10:00:00Z", Bound::From).is_err());
/// ```
pub fn parse_datestamp(value: &str, bound: Bound) -> Result<DateTime<Utc>> {
    let invalid = || {
        OaiError::BadArgument(format!(
            "Invalid date format: '{value}'. Expected YYYY-MM-DD (e.g., 2025-01-01)"
        ))
    };

    if !DATE_PATTERN.is_match(value) {
        return Err(invalid());
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    let time = match bound {
        Bound::From => date.and_hms_opt(0, 0, 0),
        Bound::Until => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
    };

    time.map(|t| t.and_utc()).ok_or_else(invalid)
}
