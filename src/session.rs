//! ログインセッション
//!
//! ログイン結果をセッションファイルに保存し、次回起動時に読み込む。
//! 権限（管理者/一般）はログイン時に一度だけ判定する。

use crate::api::Backend;
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// 権限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 全件を表形式で閲覧できる
    Admin,
    /// 1件ずつの閲覧
    Member,
}

impl Role {
    pub fn resolve(username: &str, admin_marker: &str) -> Self {
        if !admin_marker.is_empty() && username == admin_marker {
            Role::Admin
        } else {
            Role::Member
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub full_name: String,
    pub token: String,
    pub role: Role,
    /// ログイン日時
    #[serde(default)]
    pub logged_in_at: String,
}

impl Session {
    pub fn new(username: &str, full_name: &str, token: &str, admin_marker: &str) -> Self {
        Self {
            username: username.to_string(),
            full_name: full_name.to_string(),
            token: token.trim().to_string(),
            role: Role::resolve(username, admin_marker),
            logged_in_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 表示名（氏名が空ならユーザー名）
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

/// ログインしてセッションを作る
pub async fn login<B: Backend + ?Sized>(
    backend: &B,
    username: &str,
    password: &str,
    admin_marker: &str,
) -> Result<Session> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ClientError::Validation("ユーザー名とパスワードを入力してください".into()));
    }

    let reply = backend.login(username, password).await?;
    let session = Session::new(username, &reply.full_name, &reply.token, admin_marker);
    info!(username, role = session.role.as_str(), "logged in");
    Ok(session)
}

/// セッションファイル
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    const FILE_NAME: &'static str = "session.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 設定ディレクトリ内の既定の場所
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存済みセッション（なければ None、壊れていれば None）
    pub fn load(&self) -> Option<Session> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session file unreadable");
                None
            }
        }
    }

    /// ログイン必須の操作用
    pub fn require(&self) -> Result<Session> {
        self.load().ok_or(ClientError::NotLoggedIn)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// 削除した場合 true
    pub fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
