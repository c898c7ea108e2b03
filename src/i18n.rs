//! Deferred-translation text values
//!
//! Response payloads carry user-facing text that is only resolved to a
//! concrete language at serialization time. [`LazyText`] holds the message id;
//! its `Serialize` impl looks the translation up in the active locale's
//! catalog and always emits a plain JSON string, so a generic encoder never
//! sees the deferred value itself.

use std::collections::HashMap;
use std::sync::OnceLock;

use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};

static LOCALE: OnceLock<String> = OnceLock::new();

/// msgid -> translation, per locale. The "en" catalog is the identity map and
/// is therefore not stored.
static CATALOG: Lazy<HashMap<&'static str, HashMap<&'static str, &'static str>>> =
    Lazy::new(|| {
        let mut catalog = HashMap::new();

        let mut zh_cn = HashMap::new();
        zh_cn.insert("Hit count", "点击计数");
        zh_cn.insert("success", "成功");
        zh_cn.insert("no hit recorded", "未记录点击");
        zh_cn.insert("You did wrong!", "请求方式错误！");
        zh_cn.insert("Hits counted via POST only.", "只允许通过 POST 记录点击。");
        catalog.insert("zh-CN", zh_cn);

        catalog
    });

/// Set the process-wide locale. Later calls are ignored.
pub fn set_locale(locale: &str) {
    let _ = LOCALE.set(locale.to_string());
}

pub fn current_locale() -> &'static str {
    LOCALE.get().map(String::as_str).unwrap_or("en")
}

/// Resolve a message id against a specific locale, falling back to the id
/// itself when the locale or the message is unknown.
pub fn resolve_in(locale: &str, msgid: &'static str) -> &'static str {
    CATALOG
        .get(locale)
        .and_then(|messages| messages.get(msgid))
        .copied()
        .unwrap_or(msgid)
}

/// A piece of user-facing text whose translation is deferred until encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LazyText {
    msgid: &'static str,
}

/// Shorthand constructor, mirrors gettext-style call sites.
pub const fn lazy(msgid: &'static str) -> LazyText {
    LazyText { msgid }
}

impl LazyText {
    pub fn resolve(&self) -> &'static str {
        resolve_in(current_locale(), self.msgid)
    }
}

impl Serialize for LazyText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.resolve())
    }
}
