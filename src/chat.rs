//! ホーム画面のチャット
//!
//! 会話全体を `User: …` / `Assistant: …` の書き起こしにして1モデルへ送る。

use crate::api::Backend;
use crate::error::{ClientError, Result};
use crate::session::Session;
use brainmax_common::{ChatMessage, ModelCatalog, ModelSpec, Sender, single_reply};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const GREETING: &str = "こんにちは！何かお手伝いできることはありますか？";
pub const MAX_INPUT_CHARS: usize = 1000;
const ERROR_REPLY: &str = "サーバーでエラーが発生しました。しばらくしてから再試行してください。";

pub struct ChatSession<B: Backend + ?Sized> {
    backend: Arc<B>,
    session: Session,
    model: &'static ModelSpec,
    messages: Vec<ChatMessage>,
    last_exchange: Option<(String, String)>,
}

impl<B: Backend + ?Sized> ChatSession<B> {
    pub fn new(backend: Arc<B>, session: Session, model_key: &str) -> Result<Self> {
        let model = find_chat_model(model_key)?;
        Ok(Self {
            backend,
            session,
            model,
            messages: vec![ChatMessage::bot(GREETING)],
            last_exchange: None,
        })
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn model(&self) -> &'static ModelSpec {
        self.model
    }

    pub fn select_model(&mut self, key: &str) -> Result<()> {
        self.model = find_chat_model(key)?;
        debug!(model = self.model.label, "chat model selected");
        Ok(())
    }

    /// 直近の質問と回答
    pub fn last_exchange(&self) -> Option<(&str, &str)> {
        self.last_exchange
            .as_ref()
            .map(|(q, a)| (q.as_str(), a.as_str()))
    }

    /// 会話の書き起こし
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.sender.transcript_name(), m.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// メッセージを送信して返答を得る
    ///
    /// 通信失敗時はエラー文をボット発言として追加し、会話は続行できる。
    pub async fn send(&mut self, input: &str) -> Result<&str> {
        validate_input(input)?;

        let input = input.trim().to_string();
        self.messages.push(ChatMessage::user(input.clone()));
        let prompt = self.transcript();
        let models = [self.model.id.to_string()];

        let reply = self
            .backend
            .generate_analysis(&prompt, &models)
            .await
            .and_then(|results| {
                single_reply(&results, self.model)
                    .filter(|text| !text.trim().is_empty())
                    .map(str::to_string)
                    .ok_or_else(|| ClientError::Application("応答を解析できません".into()))
            });

        match reply {
            Ok(text) => {
                info!(model = self.model.label, chars = text.chars().count(), "chat reply received");
                self.messages.push(ChatMessage::bot(text.clone()));
                self.last_exchange = Some((input, text));
                Ok(self.last_reply())
            }
            Err(e) => {
                warn!(model = self.model.label, error = %e, "chat request failed");
                self.messages.push(ChatMessage::bot(ERROR_REPLY));
                Err(e)
            }
        }
    }

    /// 直近のやり取りを保存
    pub async fn save_last_exchange(&self) -> Result<()> {
        let (question, answer) = self
            .last_exchange()
            .ok_or_else(|| ClientError::Validation("保存できる会話がありません".into()))?;
        let full_name = self.session.display_name();
        self.backend
            .save_generated_copy(full_name, question, answer)
            .await?;
        info!(full_name, "chat exchange saved");
        Ok(())
    }

    fn last_reply(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Bot)
            .map(|m| m.text.as_str())
            .unwrap_or_default()
    }
}

/// 空文字と長すぎる入力を弾く
pub fn validate_input(input: &str) -> Result<()> {
    if input.trim().is_empty() {
        return Err(ClientError::Validation("メッセージを入力してください".into()));
    }
    let chars = input.chars().count();
    if chars > MAX_INPUT_CHARS {
        return Err(ClientError::Validation(format!(
            "メッセージが長すぎます（{}文字、上限{}文字）",
            chars, MAX_INPUT_CHARS
        )));
    }
    Ok(())
}

fn find_chat_model(key: &str) -> Result<&'static ModelSpec> {
    ModelCatalog::Chat
        .find(key)
        .ok_or_else(|| brainmax_common::Error::UnknownModel(key.to_string()).into())
}
