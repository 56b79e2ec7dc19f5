//! Structured run events and their localized rendering.
//!
//! The core never formats user-facing text itself. It emits an [`Event`]
//! (identifier plus named parameters) into an [`EventSink`]; sinks decide
//! how to render and where to send it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "zh" | "chinese" | "zh-cn" => Ok(Language::Zh),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::En => "en",
            Language::Zh => "zh",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageId {
    FileCompressed,
    FileSplitCompressed,
    FailedCompress,
    FailedCopy,
    SelectInput,
    OutputDirMissing,
}

impl MessageId {
    pub fn key(self) -> &'static str {
        match self {
            MessageId::FileCompressed => "file-compressed",
            MessageId::FileSplitCompressed => "file-split-compressed",
            MessageId::FailedCompress => "failed-compress",
            MessageId::FailedCopy => "failed-copy",
            MessageId::SelectInput => "select-input",
            MessageId::OutputDirMissing => "output-dir-missing",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: MessageId,
    pub level: Level,
    pub params: Vec<(&'static str, String)>,
}

impl Event {
    fn new(id: MessageId, level: Level) -> Self {
        Self {
            id,
            level,
            params: Vec::new(),
        }
    }

    fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    pub fn file_compressed(file_path: &Path, archive_name: &Path) -> Self {
        Self::new(MessageId::FileCompressed, Level::Info)
            .with("file_path", file_path.display().to_string())
            .with("archive_name", archive_name.display().to_string())
    }

    pub fn file_split_compressed(file_path: &Path, archive_path: &Path, part_count: usize) -> Self {
        Self::new(MessageId::FileSplitCompressed, Level::Info)
            .with("file_path", file_path.display().to_string())
            .with("archive_path", archive_path.display().to_string())
            .with("part_count", part_count.to_string())
    }

    /// Failure of one target; the identifier follows the error kind.
    pub fn target_failed(file_path: &Path, error: &crate::error::SplitpackError) -> Self {
        Self::new(error.message_id(), Level::Error)
            .with("file_path", file_path.display().to_string())
            .with("error", error.to_string())
    }

    pub fn select_input() -> Self {
        Self::new(MessageId::SelectInput, Level::Error)
    }

    pub fn output_dir_missing(path: &Path) -> Self {
        Self::new(MessageId::OutputDirMissing, Level::Error).with("path", path.display().to_string())
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn render(&self, language: Language) -> String {
        localize(language, self.id, &self.params)
    }
}

fn template(language: Language, id: MessageId) -> &'static str {
    match (language, id) {
        (Language::En, MessageId::FileCompressed) => "File {file_path} compressed into {archive_name}",
        (Language::En, MessageId::FileSplitCompressed) => {
            "File {file_path} is too large, split and compressed into {archive_path} with {part_count} parts"
        }
        (Language::En, MessageId::FailedCompress) => "Failed to compress {file_path} with error: {error}",
        (Language::En, MessageId::FailedCopy) => "Failed to copy {file_path} due to {error}",
        (Language::En, MessageId::SelectInput) => "Please select an input file or directory.",
        (Language::En, MessageId::OutputDirMissing) => "Output directory does not exist.",

        (Language::Zh, MessageId::FileCompressed) => "文件 {file_path} 压缩到 {archive_name}",
        (Language::Zh, MessageId::FileSplitCompressed) => {
            "文件 {file_path} 太大，分割并压缩到 {archive_path}，共 {part_count} 个部分"
        }
        (Language::Zh, MessageId::FailedCompress) => "压缩 {file_path} 失败，错误: {error}",
        (Language::Zh, MessageId::FailedCopy) => "复制 {file_path} 失败，错误: {error}",
        (Language::Zh, MessageId::SelectInput) => "请选择一个输入文件或目录。",
        (Language::Zh, MessageId::OutputDirMissing) => "输出目录不存在。",
    }
}

/// Render message `id` in `language`, substituting `{name}` placeholders.
/// Placeholders without a matching parameter are left as written.
pub fn localize(language: Language, id: MessageId, params: &[(&str, String)]) -> String {
    let tpl = template(language, id);
    let mut out = String::with_capacity(tpl.len() + 32);
    let mut rest = tpl;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match params.iter().find(|(k, _)| *k == name) {
                    Some((_, v)) => out.push_str(v),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Renders events in one language and writes them through `tracing`.
#[derive(Clone, Debug, Default)]
pub struct TracingSink {
    pub language: Language,
}

impl TracingSink {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        let text = event.render(self.language);
        match event.level {
            Level::Info => tracing::info!(message_id = event.id.key(), "{text}"),
            Level::Error => tracing::error!(message_id = event.id.key(), "{text}"),
        }
    }
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        if let Ok(mut v) = self.events.lock() {
            v.push(event);
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, event: Event) {
        (**self).emit(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SplitpackError;
    use std::path::PathBuf;

    #[test]
    fn renders_english_and_chinese() {
        let ev = Event::file_split_compressed(Path::new("/in/big.iso"), Path::new("/out/big.iso"), 3);
        assert_eq!(
            ev.render(Language::En),
            "File /in/big.iso is too large, split and compressed into /out/big.iso with 3 parts"
        );
        assert_eq!(
            ev.render(Language::Zh),
            "文件 /in/big.iso 太大，分割并压缩到 /out/big.iso，共 3 个部分"
        );
    }

    #[test]
    fn missing_placeholder_left_verbatim() {
        let s = localize(Language::En, MessageId::FailedCopy, &[("file_path", "x".into())]);
        assert_eq!(s, "Failed to copy x due to {error}");
    }

    #[test]
    fn parameterless_messages() {
        assert_eq!(
            localize(Language::Zh, MessageId::OutputDirMissing, &[]),
            "输出目录不存在。"
        );
        assert_eq!(
            Event::select_input().render(Language::En),
            "Please select an input file or directory."
        );
    }

    #[test]
    fn every_message_fills_its_placeholders_in_both_languages() {
        let params = [
            ("file_path", "/in/a".to_string()),
            ("archive_name", "a.7z".to_string()),
            ("archive_path", "/out/a".to_string()),
            ("part_count", "2".to_string()),
            ("error", "boom".to_string()),
        ];
        let ids = [
            MessageId::FileCompressed,
            MessageId::FileSplitCompressed,
            MessageId::FailedCompress,
            MessageId::FailedCopy,
            MessageId::SelectInput,
            MessageId::OutputDirMissing,
        ];
        for id in ids {
            for lang in [Language::En, Language::Zh] {
                let s = localize(lang, id, &params);
                assert!(!s.is_empty());
                assert!(!s.contains('{'), "{} in {lang}: {s}", id.key());
            }
        }
        let errors = [
            SplitpackError::InputMissing,
            SplitpackError::OutputDirectoryMissing { path: PathBuf::new() },
            SplitpackError::InvalidRequest("x".into()),
        ];
        for e in &errors {
            assert!(ids.contains(&e.message_id()));
        }
    }

    #[test]
    fn language_parses_loosely() {
        assert_eq!("ZH".parse::<Language>().unwrap(), Language::Zh);
        assert_eq!("english".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.emit(Event::file_compressed(&PathBuf::from("a"), &PathBuf::from("a.7z")));
        sink.emit(Event::select_input());
        let ids: Vec<_> = sink.events().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![MessageId::FileCompressed, MessageId::SelectInput]);
        assert_eq!(sink.events()[0].param("archive_name"), Some("a.7z"));
    }
}
