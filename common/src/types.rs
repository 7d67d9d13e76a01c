//! バックエンドとやり取りするデータ型
//!
//! CLIとライブラリで共有される型:
//! - Record: 保存済みの質問/回答（検索エンドポイントの出力）
//! - UploadedFile: アップロード済み文書（OCRテキスト・AI解析結果付き）
//! - ChatMessage: チャット画面の1メッセージ
//!
//! ワイヤ形式はバックエンドに合わせてsnake_case。
//! 文字列フィールドは `null` / 欠落を空文字として扱う。

use serde::{Deserialize, Deserializer, Serialize};

/// `null` を空文字として読み込む
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// 質問/回答レコード
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub full_name: String,     // 所有ユーザー名

    #[serde(default, deserialize_with = "null_as_empty")]
    pub question: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub answer: String,
}

impl Record {
    /// 必須3フィールドがすべて空でないか
    pub fn is_complete(&self) -> bool {
        !self.full_name.trim().is_empty()
            && !self.question.trim().is_empty()
            && !self.answer.trim().is_empty()
    }
}

/// アップロード済みファイル
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: i64,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub file_name: String,

    /// OCRテキスト（未スキャンなら空）
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scanned_text: String,

    /// AI解析結果（未解析なら空）
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ai_generated_text: String,
}

impl UploadedFile {
    pub fn is_scanned(&self) -> bool {
        !self.scanned_text.trim().is_empty()
    }

    pub fn is_analyzed(&self) -> bool {
        !self.ai_generated_text.trim().is_empty()
    }
}

/// チャット送信者
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// 会話ログ上の話者名
    pub fn transcript_name(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Bot => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { sender: Sender::User, text: text.into() }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { sender: Sender::Bot, text: text.into() }
    }
}
