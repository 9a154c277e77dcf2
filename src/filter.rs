use crate::slack::ChannelRecord;

/// Keyword filter over channel name, topic and purpose.
#[derive(Debug, Clone, Default)]
pub struct ChannelFilter {
    keywords: Vec<String>,
    case_sensitive: bool,
}

impl ChannelFilter {
    /// Parse a comma-separated keyword list, e.g. `"billing, subscription"`.
    pub fn parse(input: &str, case_sensitive: bool) -> Self {
        let keywords = input
            .split(',')
            .map(str::trim)
            .filter(|kw| !kw.is_empty())
            .map(|kw| {
                if case_sensitive {
                    kw.to_string()
                } else {
                    kw.to_lowercase()
                }
            })
            .collect();
        Self {
            keywords,
            case_sensitive,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True if any keyword occurs in the channel's name, topic or purpose.
    /// An empty filter matches everything.
    pub fn matches(&self, channel: &ChannelRecord) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let fold = |s: &str| {
            if self.case_sensitive {
                s.to_string()
            } else {
                s.to_lowercase()
            }
        };
        let fields = [
            fold(&channel.name),
            fold(&channel.topic),
            fold(&channel.purpose),
        ];
        self.keywords
            .iter()
            .any(|kw| fields.iter().any(|f| f.contains(kw.as_str())))
    }

    pub fn apply(&self, channels: Vec<ChannelRecord>) -> Vec<ChannelRecord> {
        channels.into_iter().filter(|ch| self.matches(ch)).collect()
    }
}

/// Pick channels by name (a leading `#` is ignored). Returns the matches in
/// the order requested, plus the names that were not found.
pub fn select_by_name(
    channels: &[ChannelRecord],
    names: &[String],
) -> (Vec<ChannelRecord>, Vec<String>) {
    let mut selected = Vec::new();
    let mut missing = Vec::new();
    for name in names {
        let name = name.trim_start_matches('#');
        match channels.iter().find(|ch| ch.name == name) {
            Some(ch) => selected.push(ch.clone()),
            None => missing.push(name.to_string()),
        }
    }
    (selected, missing)
}
