//! Resumption tokens and paging of list responses.
//!
//! A token is the url-encoded set of original request arguments plus the
//! offset of the next page, so no state is kept between requests.

use chrono::{DateTime, SecondsFormat, Utc};

use super::request::{Selection, Verb};
use crate::error::{OaiError, Result};

/// State rendered as the `resumptionToken` element of a list response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumptionState {
    /// Token for the next page, `None` on the last page.
    pub token: Option<String>,
    /// Offset of the first item of the current page.
    pub cursor: usize,
    pub complete_list_size: usize,
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub resumption: Option<ResumptionState>,
}

/// Cut the page starting at `offset` out of the complete result list.
///
/// Lists that fit in a single page carry no resumption state.
pub fn paginate<T>(
    items: Vec<T>,
    offset: usize,
    batch_size: usize,
    next_token: impl FnOnce(usize) -> String,
) -> Result<Page<T>> {
    let total = items.len();
    if offset > 0 && offset >= total {
        return Err(OaiError::BadResumptionToken(format!(
            "offset {offset} is beyond the end of the list ({total} entries)"
        )));
    }

    let batch_size = batch_size.max(1);
    let end = offset.saturating_add(batch_size).min(total);
    let page: Vec<T> = items.into_iter().skip(offset).take(batch_size).collect();

    let resumption = if offset == 0 && end == total {
        None
    } else {
        Some(ResumptionState {
            token: (end < total).then(|| next_token(end)),
            cursor: offset,
            complete_list_size: total,
        })
    };

    Ok(Page {
        items: page,
        resumption,
    })
}

fn format_bound(bound: &DateTime<Utc>) -> String {
    bound.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Token continuing a ListIdentifiers/ListRecords request at `offset`.
#[must_use]
pub fn encode_selection(verb: Verb, selection: &Selection, offset: usize) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.append_pair("verb", verb.as_str());
    serializer.append_pair("metadataPrefix", selection.prefix.as_str());
    if let Some(ref set) = selection.set {
        serializer.append_pair("set", set);
    }
    if let Some(ref from) = selection.from {
        serializer.append_pair("from", &format_bound(from));
    }
    if let Some(ref until) = selection.until {
        serializer.append_pair("until", &format_bound(until));
    }
    serializer.append_pair("offset", &offset.to_string());
    serializer.finish()
}

/// Token continuing a ListSets request at `offset`.
#[must_use]
pub fn encode_sets(offset: usize) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("verb", Verb::ListSets.as_str())
        .append_pair("offset", &offset.to_string())
        .finish()
}

fn bad_token(token: &str) -> OaiError {
    OaiError::BadResumptionToken(token.to_string())
}

fn token_pairs(verb: Verb, token: &str) -> Result<Vec<(String, String)>> {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(token.as_bytes())
        .into_owned()
        .collect();

    let token_verb = pairs.iter().find(|(k, _)| k == "verb").map(|(_, v)| v.as_str());
    if token_verb != Some(verb.as_str()) {
        return Err(bad_token(token));
    }
    Ok(pairs)
}

fn parse_offset(pairs: &[(String, String)], token: &str) -> Result<usize> {
    pairs
        .iter()
        .find(|(k, _)| k == "offset")
        .and_then(|(_, v)| v.parse().ok())
        .ok_or_else(|| bad_token(token))
}

/// Restore the selection and offset carried by a token.
pub fn decode_selection(verb: Verb, token: &str) -> Result<Selection> {
    let pairs = token_pairs(verb, token)?;
    let offset = parse_offset(&pairs, token)?;

    let value = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    let parse_bound = |key: &str| -> Result<Option<DateTime<Utc>>> {
        value(key)
            .map(|v| {
                DateTime::parse_from_rfc3339(v)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|_| bad_token(token))
            })
            .transpose()
    };

    let prefix = value("metadataPrefix")
        .ok_or_else(|| bad_token(token))?
        .parse()
        .map_err(|_| bad_token(token))?;

    Ok(Selection {
        prefix,
        set: value("set").map(str::to_string),
        from: parse_bound("from")?,
        until: parse_bound("until")?,
        offset,
    })
}

/// Restore the offset carried by a ListSets token.
pub fn decode_sets(token: &str) -> Result<usize> {
    let pairs = token_pairs(Verb::ListSets, token)?;
    parse_offset(&pairs, token)
}
