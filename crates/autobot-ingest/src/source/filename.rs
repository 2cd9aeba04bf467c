//! Feed file naming convention
//!
//! Feed files are named `<prefix><YYYYMMDD>-<HHMMSS>.<ext>`, for example
//! `ESStatistikListeModtag-20230102-000000.zip`. Recency is decided by the
//! embedded date and time compared numerically, never by comparing whole
//! names, because prefixes differ in length.

/// A file name that follows the feed convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFileName {
    pub name: String,
    pub prefix: String,
    pub date: u32,
    pub time: u32,
}

impl FeedFileName {
    /// `None` when `name` does not follow the convention.
    pub fn parse(name: &str) -> Option<Self> {
        let (stem, ext) = name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        let (head, time) = stem.rsplit_once('-')?;
        if time.len() != 6 || head.len() < 8 {
            return None;
        }
        let split = head.len() - 8;
        if !head.is_char_boundary(split) {
            return None;
        }
        let (prefix, date) = head.split_at(split);
        if !all_digits(date) || !all_digits(time) {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            date: date.parse().ok()?,
            time: time.parse().ok()?,
        })
    }

    pub fn stamp(&self) -> (u32, u32) {
        (self.date, self.time)
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Whether `candidate` is strictly newer than `known`.
///
/// A `known` name that does not follow the convention (including the empty
/// string) is older than every conforming candidate.
pub fn is_newer(candidate: &str, known: &str) -> bool {
    let Some(candidate) = FeedFileName::parse(candidate) else {
        return false;
    };
    match FeedFileName::parse(known) {
        Some(known) => candidate.stamp() > known.stamp(),
        None => true,
    }
}

/// The newest conforming name strictly newer than `known`, if any.
pub fn latest_newer<I, S>(names: I, known: &str) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|n| FeedFileName::parse(n.as_ref()))
        .filter(|n| is_newer(&n.name, known))
        .max_by_key(FeedFileName::stamp)
        .map(|n| n.name)
}
