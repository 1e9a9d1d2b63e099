use regex::Regex;
use std::collections::BTreeMap;

/// Shown when every lyrics source came up empty.
pub const NO_LYRICS: &str = "[00:00.00]No lyrics.";
/// Shown while a fetch for the current song is in flight.
pub const FETCHING: &str = "[00:00.00]Fetching...";

#[derive(Debug, Clone, PartialEq)]
pub struct LrcLine {
    /// Offset into the song; 0 for untimed text.
    pub time_ms: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Lyrics {
    /// `[ti:…]`, `[ar:…]`, `[al:…]`, `[by:…]` and friends.
    pub tags: BTreeMap<String, String>,
    pub lines: Vec<LrcLine>,
    /// False for plain text: there is no current line to follow.
    pub timed: bool,
}

impl Lyrics {
    pub fn placeholder() -> Self {
        Self::parse(NO_LYRICS)
    }

    /// Parse LRC text. Lines are ordered by time (ties keep file order);
    /// text without any timestamp is kept as untimed lines.
    pub fn parse(text: &str) -> Self {
        let (Ok(tag_re), Ok(time_re)) = (
            Regex::new(r"^\[([a-z]+):(.*)\]$"),
            Regex::new(r"^\[(\d+):(\d{1,2})(?:[.:](\d{1,3}))?\]"),
        ) else {
            return Self::default();
        };

        let mut tags = BTreeMap::new();
        let mut timed: Vec<LrcLine> = Vec::new();
        let mut plain: Vec<LrcLine> = Vec::new();

        for raw in text.lines() {
            let line = raw.trim();
            if let Some(caps) = tag_re.captures(line) {
                tags.insert(caps[1].to_string(), caps[2].trim().to_string());
                continue;
            }

            // several stamps may share one lyric: [00:10.00][01:20.00]text
            let mut rest = line;
            let mut stamps = Vec::new();
            while let Some(caps) = time_re.captures(rest) {
                let mm: u32 = caps[1].parse().unwrap_or(0);
                let ss: u32 = caps[2].parse().unwrap_or(0);
                let frac = caps.get(3).map_or(0, |m| {
                    let digits = m.as_str();
                    let v: u32 = digits.parse().unwrap_or(0);
                    match digits.len() {
                        1 => v * 100,
                        2 => v * 10,
                        _ => v,
                    }
                });
                stamps.push(mm * 60_000 + ss * 1000 + frac);
                rest = &rest[caps[0].len()..];
            }

            if stamps.is_empty() {
                plain.push(LrcLine {
                    time_ms: 0,
                    text: line.to_string(),
                });
            } else {
                for time_ms in stamps {
                    timed.push(LrcLine {
                        time_ms,
                        text: rest.trim().to_string(),
                    });
                }
            }
        }

        if !timed.is_empty() {
            timed.sort_by_key(|l| l.time_ms);
            return Self {
                tags,
                lines: timed,
                timed: true,
            };
        }

        // trim blank edges of plain text
        while plain.last().is_some_and(|l| l.text.is_empty()) {
            plain.pop();
        }
        let first = plain.iter().position(|l| !l.text.is_empty());
        let lines = match first {
            Some(i) => plain.split_off(i),
            None => Vec::new(),
        };
        if lines.is_empty() && tags.is_empty() {
            return Self::placeholder_lines();
        }
        Self {
            tags,
            lines,
            timed: false,
        }
    }

    fn placeholder_lines() -> Self {
        Self {
            tags: BTreeMap::new(),
            lines: vec![LrcLine {
                time_ms: 0,
                text: "No lyrics.".to_string(),
            }],
            timed: true,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.tags.get("ti").map(String::as_str)
    }

    pub fn artist(&self) -> Option<&str> {
        self.tags.get("ar").map(String::as_str)
    }

    pub fn album(&self) -> Option<&str> {
        self.tags.get("al").map(String::as_str)
    }

    /// Index of the line being sung at `elapsed_ms`.
    pub fn current_line(&self, elapsed_ms: u32) -> Option<usize> {
        if !self.timed {
            return None;
        }
        let after = self.lines.partition_point(|l| l.time_ms <= elapsed_ms);
        after.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "[ti:Song]\n[ar:Band]\n[by:someone]\n\
        [00:12.50]second\n[00:01.00]first\n[00:30.00][01:00.00]chorus\n";

    #[test]
    fn test_tags_and_sorted_lines() {
        let lrc = Lyrics::parse(SAMPLE);
        assert_eq!(lrc.title(), Some("Song"));
        assert_eq!(lrc.artist(), Some("Band"));
        assert_eq!(lrc.album(), None);
        assert!(lrc.timed);
        let texts: Vec<_> = lrc.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "chorus", "chorus"]);
        assert_eq!(lrc.lines[1].time_ms, 12_500);
        assert_eq!(lrc.lines[3].time_ms, 60_000);
    }

    #[test]
    fn test_equal_times_keep_file_order() {
        let lrc = Lyrics::parse("[00:05.00]a\n[00:05.00]b\n");
        assert_eq!(lrc.lines[0].text, "a");
        assert_eq!(lrc.lines[1].text, "b");
    }

    #[test]
    fn test_current_line_follows_time() {
        let lrc = Lyrics::parse(SAMPLE);
        assert_eq!(lrc.current_line(0), None);
        assert_eq!(lrc.current_line(1_000), Some(0));
        assert_eq!(lrc.current_line(29_999), Some(1));
        assert_eq!(lrc.current_line(500_000), Some(3));
    }

    #[test]
    fn test_plain_text_is_untimed() {
        let lrc = Lyrics::parse("\nfirst verse\nsecond verse\n\n");
        assert!(!lrc.timed);
        assert_eq!(lrc.lines.len(), 2);
        assert_eq!(lrc.current_line(10_000), None);
    }

    #[test]
    fn test_empty_and_placeholders() {
        let empty = Lyrics::parse("");
        assert_eq!(empty.lines[0].text, "No lyrics.");
        assert_eq!(Lyrics::placeholder().lines[0].text, "No lyrics.");
        assert_eq!(Lyrics::parse(FETCHING).lines[0].text, "Fetching...");
    }

    #[test]
    fn test_three_digit_fraction() {
        let lrc = Lyrics::parse("[01:02.345]x\n");
        assert_eq!(lrc.lines[0].time_ms, 62_345);
    }
}
