//! AIモデルカタログ
//!
//! 解析エンドポイントに渡すモデルIDは固定の列挙から選ぶ。
//! チャット用と文書解析用でカタログが異なる。

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// モデル定義
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    /// リクエストに載せるID
    pub id: &'static str,
    /// 表示名
    pub label: &'static str,
    /// レスポンスのキー（バックエンドが内部名で返す場合）
    pub response_key: Option<&'static str>,
}

pub const CHAT_MODELS: &[ModelSpec] = &[
    ModelSpec { id: "1", label: "Deepseek-R1", response_key: Some("deepseek/deepseek-r1:free") },
    ModelSpec { id: "2", label: "Gemini2.5", response_key: None },
    ModelSpec { id: "3", label: "Claude4.0", response_key: None },
    ModelSpec { id: "4", label: "Claude3.7", response_key: None },
    ModelSpec { id: "5", label: "ChatGPT4o", response_key: Some("openai/gpt-4o") },
];

pub const DOCUMENT_MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "6",
        label: "Gemini2.0-Flash",
        response_key: Some("google/gemini-2.0-flash-exp:free"),
    },
];

/// カタログ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelCatalog {
    #[default]
    Chat,
    Document,
}

impl ModelCatalog {
    pub fn models(&self) -> &'static [ModelSpec] {
        match self {
            ModelCatalog::Chat => CHAT_MODELS,
            ModelCatalog::Document => DOCUMENT_MODELS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelCatalog::Chat => "chat",
            ModelCatalog::Document => "document",
        }
    }

    /// IDまたは表示名（大文字小文字無視）で検索
    pub fn find(&self, key: &str) -> Option<&'static ModelSpec> {
        let key = key.trim();
        self.models()
            .iter()
            .find(|m| m.id == key || m.label.eq_ignore_ascii_case(key))
    }

    /// 指定キー列をモデル定義に解決（重複は除去、順序は維持）
    pub fn resolve(&self, keys: &[String]) -> Result<Vec<&'static ModelSpec>> {
        let mut resolved: Vec<&'static ModelSpec> = Vec::new();
        for key in keys {
            let spec = self
                .find(key)
                .ok_or_else(|| Error::UnknownModel(key.clone()))?;
            if !resolved.iter().any(|m| m.id == spec.id) {
                resolved.push(spec);
            }
        }
        Ok(resolved)
    }
}

impl std::str::FromStr for ModelCatalog {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(ModelCatalog::Chat),
            "document" | "doc" => Ok(ModelCatalog::Document),
            _ => Err(format!("Unknown catalog: {}. Use chat or document", s)),
        }
    }
}

/// レスポンスから指定モデルの生成テキストを取り出す
///
/// 表示名 → ID → レスポンスキーの順に探す。
pub fn reply_for<'a>(results: &'a BTreeMap<String, String>, model: &ModelSpec) -> Option<&'a str> {
    results
        .get(model.label)
        .or_else(|| results.get(model.id))
        .or_else(|| model.response_key.and_then(|k| results.get(k)))
        .map(String::as_str)
}

/// 単一モデル時の取り出し（見つからなければ最初の値）
pub fn single_reply<'a>(results: &'a BTreeMap<String, String>, model: &ModelSpec) -> Option<&'a str> {
    reply_for(results, model).or_else(|| results.values().next().map(String::as_str))
}

/// 表示用に結果を連結
///
/// 1モデルならそのまま、複数なら表示名のタグを付けて空行区切りで連結する。
pub fn combine_replies(results: &BTreeMap<String, String>, models: &[&ModelSpec]) -> String {
    match models {
        [] => String::new(),
        [model] => single_reply(results, model).unwrap_or_default().to_string(),
        _ => models
            .iter()
            .filter_map(|m| reply_for(results, m).map(|text| format!("[{}]\n{}", m.label, text)))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_find_by_id_and_label() {
        assert_eq!(ModelCatalog::Chat.find("3").map(|m| m.label), Some("Claude4.0"));
        assert_eq!(ModelCatalog::Chat.find("chatgpt4o").map(|m| m.id), Some("5"));
        assert!(ModelCatalog::Chat.find("6").is_none());
        assert!(ModelCatalog::Document.find("6").is_some());
    }

    #[test]
    fn test_resolve_dedup_and_unknown() {
        let keys = vec!["1".to_string(), "Deepseek-R1".to_string(), "2".to_string()];
        let models = ModelCatalog::Chat.resolve(&keys).expect("解決失敗");
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "1");

        let err = ModelCatalog::Chat.resolve(&["x".to_string()]).unwrap_err();
        assert!(matches!(err, Error::UnknownModel(_)));
    }

    #[test]
    fn test_reply_lookup_order() {
        let model = ModelCatalog::Document.find("6").unwrap();
        let r = results(&[("google/gemini-2.0-flash-exp:free", "by key")]);
        assert_eq!(reply_for(&r, model), Some("by key"));

        let r = results(&[("6", "by id"), ("Gemini2.0-Flash", "by label")]);
        assert_eq!(reply_for(&r, model), Some("by label"));
    }

    #[test]
    fn test_single_reply_falls_back_to_first_value() {
        let model = ModelCatalog::Chat.find("2").unwrap();
        let r = results(&[("something-else", "fallback")]);
        assert_eq!(reply_for(&r, model), None);
        assert_eq!(single_reply(&r, model), Some("fallback"));
    }

    #[test]
    fn test_combine_multiple_tagged() {
        let models = ModelCatalog::Chat
            .resolve(&["1".to_string(), "3".to_string()])
            .unwrap();
        let r = results(&[("1", "alpha"), ("Claude4.0", "beta")]);
        let combined = combine_replies(&r, &models);
        assert_eq!(combined, "[Deepseek-R1]\nalpha\n\n[Claude4.0]\nbeta");
    }

    #[test]
    fn test_catalog_from_str() {
        assert_eq!("doc".parse::<ModelCatalog>(), Ok(ModelCatalog::Document));
        assert!("other".parse::<ModelCatalog>().is_err());
    }
}
