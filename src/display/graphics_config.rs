//! Line-preserving editor for the game's graphics `.ini` file.
//!
//! The file belongs to the game, so everything except the keys we set is
//! written back exactly as it was read: comments, blank lines, key spacing and
//! line endings included, along with a leading byte order mark.

use crate::error::{AppError, Result};

pub const RENDER_SECTION: &str = "Render";
pub const RESOLUTION_KEY: &str = "Resolution";
pub const BORDERLESS_UPSCALE_KEY: &str = "BorderlessUpscale";

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq)]
enum ConfigLine {
    /// Blank lines and `#`/`;` comments.
    Verbatim(String),
    Section { name: String, raw: String },
    Entry {
        key: String,
        value: String,
        /// Everything up to the value, e.g. `Resolution = `.
        lead: String,
    },
}

impl ConfigLine {
    fn render(&self) -> String {
        match self {
            ConfigLine::Verbatim(raw) | ConfigLine::Section { raw, .. } => raw.clone(),
            ConfigLine::Entry { value, lead, .. } => format!("{}{}", lead, value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsConfig {
    lines: Vec<ConfigLine>,
    line_ending: &'static str,
    trailing_newline: bool,
    bom: bool,
}

impl GraphicsConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        let (bom, raw) = match raw.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let line_ending = if raw.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing_newline = raw.ends_with('\n');

        let mut lines = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            lines.push(parse_line(line).ok_or_else(|| {
                AppError::ParseError(format!(
                    "graphics config line {} is not a section, comment or key=value: '{}'",
                    idx + 1,
                    line
                ))
            })?);
        }

        Ok(Self {
            lines,
            line_ending,
            trailing_newline,
            bom,
        })
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.entry_index(section, key).and_then(|idx| match &self.lines[idx] {
            ConfigLine::Entry { value, .. } => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.get(section, key)
            .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            })
    }

    /// Sets `key` in `section`, adding the key (and the section) when missing.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        let value = value.into();

        if let Some(idx) = self.entry_index(section, key) {
            if let ConfigLine::Entry { value: current, .. } = &mut self.lines[idx] {
                *current = value;
            }
            return;
        }

        let new_entry = ConfigLine::Entry {
            key: key.to_string(),
            value,
            lead: format!("{}=", key),
        };

        match self.section_insert_index(section) {
            Some(idx) => self.lines.insert(idx, new_entry),
            None => {
                let needs_separator = self
                    .lines
                    .last()
                    .map_or(false, |line| !matches!(line, ConfigLine::Verbatim(raw) if raw.trim().is_empty()));
                if needs_separator {
                    self.lines.push(ConfigLine::Verbatim(String::new()));
                }
                self.lines.push(ConfigLine::Section {
                    name: section.to_string(),
                    raw: format!("[{}]", section),
                });
                self.lines.push(new_entry);
            }
        }
    }

    pub fn set_bool(&mut self, section: &str, key: &str, value: bool) {
        self.set(section, key, if value { "true" } else { "false" });
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        if self.bom {
            out.push(BOM);
        }
        out.push_str(
            &self
                .lines
                .iter()
                .map(ConfigLine::render)
                .collect::<Vec<_>>()
                .join(self.line_ending),
        );
        if self.trailing_newline || self.lines.is_empty() {
            out.push_str(self.line_ending);
        }
        out
    }

    /// Index of `key` within `section`. Keys before the first header belong to section "".
    fn entry_index(&self, section: &str, key: &str) -> Option<usize> {
        let mut current_section = "";
        for (idx, line) in self.lines.iter().enumerate() {
            match line {
                ConfigLine::Section { name, .. } => current_section = name.as_str(),
                ConfigLine::Entry { key: k, .. }
                    if current_section.eq_ignore_ascii_case(section)
                        && k.eq_ignore_ascii_case(key) =>
                {
                    return Some(idx);
                }
                _ => {}
            }
        }
        None
    }

    /// Position right after the last entry of `section`, or `None` if the section is absent.
    fn section_insert_index(&self, section: &str) -> Option<usize> {
        let mut current_section = "";
        let mut found = section.is_empty() && !self.lines.is_empty();
        let mut insert_at = if found { Some(0) } else { None };

        for (idx, line) in self.lines.iter().enumerate() {
            match line {
                ConfigLine::Section { name, .. } => {
                    current_section = name.as_str();
                    if name.eq_ignore_ascii_case(section) {
                        found = true;
                        insert_at = Some(idx + 1);
                    }
                }
                ConfigLine::Entry { .. } if current_section.eq_ignore_ascii_case(section) => {
                    insert_at = Some(idx + 1);
                }
                _ => {}
            }
        }

        if found {
            insert_at
        } else {
            None
        }
    }
}

fn parse_line(line: &str) -> Option<ConfigLine> {
    let trimmed = line.trim();

    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
        return Some(ConfigLine::Verbatim(line.to_string()));
    }

    if let Some(rest) = trimmed.strip_prefix('[') {
        let close = rest.find(']')?;
        let tail = rest[close + 1..].trim_start();
        if !(tail.is_empty() || tail.starts_with('#') || tail.starts_with(';')) {
            return None;
        }
        return Some(ConfigLine::Section {
            name: rest[..close].trim().to_string(),
            raw: line.to_string(),
        });
    }

    let eq = line.find('=')?;
    let key = line[..eq].trim();
    if key.is_empty() {
        return None;
    }
    let after = &line[eq + 1..];
    let value = after.trim_start();
    let lead_len = eq + 1 + (after.len() - value.len());

    Some(ConfigLine::Entry {
        key: key.to_string(),
        value: value.to_string(),
        lead: line[..lead_len].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# SSE Display Tweaks\n\
        [Render]\n\
        # Resolution used by the game\n\
        Resolution=1920x1080\n\
        Fullscreen = false\n\
        BorderlessUpscale=false\n\
        \n\
        [Framerate]\n\
        ; limits\n\
        FramerateLimit=60\n\
        Resolution=ignored\n";

    #[test]
    fn test_unchanged_document_round_trips_byte_for_byte() {
        let config = GraphicsConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.serialize(), SAMPLE);
    }

    #[test]
    fn test_crlf_is_preserved() {
        let raw = "[Render]\r\nResolution=800x600\r\n";
        let mut config = GraphicsConfig::parse(raw).unwrap();
        config.set(RENDER_SECTION, RESOLUTION_KEY, "1024x768");
        assert_eq!(config.serialize(), "[Render]\r\nResolution=1024x768\r\n");
    }

    #[test]
    fn test_set_only_touches_target_keys() {
        let mut config = GraphicsConfig::parse(SAMPLE).unwrap();
        config.set(RENDER_SECTION, RESOLUTION_KEY, "2560x1440");
        config.set_bool(RENDER_SECTION, BORDERLESS_UPSCALE_KEY, true);

        let written = config.serialize();
        let reparsed = GraphicsConfig::parse(&written).unwrap();
        assert_eq!(reparsed.get(RENDER_SECTION, RESOLUTION_KEY), Some("2560x1440"));
        assert_eq!(reparsed.get_bool(RENDER_SECTION, BORDERLESS_UPSCALE_KEY), Some(true));
        assert_eq!(reparsed.get(RENDER_SECTION, "Fullscreen"), Some("false"));
        assert_eq!(reparsed.get("Framerate", "FramerateLimit"), Some("60"));
        assert_eq!(reparsed.get("Framerate", RESOLUTION_KEY), Some("ignored"));

        let expected = SAMPLE
            .replace("Resolution=1920x1080", "Resolution=2560x1440")
            .replace("BorderlessUpscale=false", "BorderlessUpscale=true");
        assert_eq!(written, expected);
    }

    #[test]
    fn test_spacing_around_equals_is_kept() {
        let mut config = GraphicsConfig::parse("[Render]\nResolution =  640x480\n").unwrap();
        config.set(RENDER_SECTION, RESOLUTION_KEY, "1280x720");
        assert_eq!(config.serialize(), "[Render]\nResolution =  1280x720\n");
    }

    #[test]
    fn test_missing_key_is_added_to_existing_section() {
        let mut config = GraphicsConfig::parse("[Render]\nResolution=800x600\n\n[Other]\nA=1\n").unwrap();
        config.set_bool(RENDER_SECTION, BORDERLESS_UPSCALE_KEY, false);
        assert_eq!(
            config.serialize(),
            "[Render]\nResolution=800x600\nBorderlessUpscale=false\n\n[Other]\nA=1\n"
        );
    }

    #[test]
    fn test_missing_section_is_appended() {
        let mut config = GraphicsConfig::parse("[Other]\nA=1\n").unwrap();
        config.set(RENDER_SECTION, RESOLUTION_KEY, "800x600");
        assert_eq!(config.serialize(), "[Other]\nA=1\n\n[Render]\nResolution=800x600\n");
    }

    #[test]
    fn test_keys_match_case_insensitively() {
        let config = GraphicsConfig::parse("[render]\nresolution=800x600\n").unwrap();
        assert_eq!(config.get(RENDER_SECTION, RESOLUTION_KEY), Some("800x600"));
    }

    #[test]
    fn test_byte_order_mark_is_kept() {
        let raw = "\u{feff}[Render]\r\nResolution=800x600\r\n";
        let untouched = GraphicsConfig::parse(raw).unwrap();
        assert_eq!(untouched.serialize(), raw);

        let mut config = untouched;
        assert_eq!(config.get(RENDER_SECTION, RESOLUTION_KEY), Some("800x600"));
        config.set(RENDER_SECTION, RESOLUTION_KEY, "1920x1080");
        assert_eq!(
            config.serialize(),
            "\u{feff}[Render]\r\nResolution=1920x1080\r\n"
        );
    }

    #[test]
    fn test_section_header_may_carry_comment() {
        let raw = "[Render] # video\nResolution=800x600\n[Misc];other\nA=1\n";
        let mut config = GraphicsConfig::parse(raw).unwrap();
        assert_eq!(config.get(RENDER_SECTION, RESOLUTION_KEY), Some("800x600"));
        assert_eq!(config.get("Misc", "A"), Some("1"));

        config.set(RENDER_SECTION, RESOLUTION_KEY, "1280x720");
        assert_eq!(
            config.serialize(),
            "[Render] # video\nResolution=1280x720\n[Misc];other\nA=1\n"
        );
    }

    #[test]
    fn test_section_header_with_trailing_text_is_rejected() {
        let err = GraphicsConfig::parse("[Render] extra\nResolution=800x600\n").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_garbage_line_is_rejected() {
        let err = GraphicsConfig::parse("[Render]\nthis is not ini\n").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }
}
