use thiserror::Error;

/// パイプラインの各ステップ（ステップ別のエラー表示に使う）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Upload,
    Scan,
    SaveText,
    Analyze,
    SaveAnalysis,
}

impl PipelineStep {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStep::Upload => "アップロード",
            PipelineStep::Scan => "スキャン",
            PipelineStep::SaveText => "テキスト保存",
            PipelineStep::Analyze => "AI解析",
            PipelineStep::SaveAnalysis => "解析結果保存",
        }
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// 失敗の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// リクエストが完了しなかった
    Network,
    /// `success: false` が返った
    Application,
    /// 送信前の入力チェックで弾いた
    Validation,
    /// ローカル処理（ファイル・設定・Excel）
    Local,
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("ネットワークエラー: {0}")]
    Network(String),

    #[error("サーバーエラー: {0}")]
    Application(String),

    #[error("入力エラー: {0}")]
    Validation(String),

    #[error("ログインしていません。`brainmax login` でログインしてください")]
    NotLoggedIn,

    #[error("{step}失敗: {source}")]
    Step {
        step: PipelineStep,
        #[source]
        source: Box<ClientError>,
    },

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] brainmax_common::Error),
}

impl ClientError {
    /// ステップ情報を付与
    pub fn at(self, step: PipelineStep) -> Self {
        ClientError::Step { step, source: Box::new(self) }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::Network(_) => FailureKind::Network,
            ClientError::Application(_) => FailureKind::Application,
            ClientError::Validation(_) | ClientError::NotLoggedIn => FailureKind::Validation,
            ClientError::Step { source, .. } => source.kind(),
            ClientError::Common(brainmax_common::Error::UnknownModel(_))
            | ClientError::Common(brainmax_common::Error::UnknownSortKey(_)) => FailureKind::Validation,
            _ => FailureKind::Local,
        }
    }

    /// 失敗したステップ（ステップ外のエラーなら None）
    pub fn step(&self) -> Option<PipelineStep> {
        match self {
            ClientError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Network(format!("レスポンスの解析に失敗: {}", e))
        } else if e.is_timeout() {
            ClientError::Network(format!("タイムアウト: {}", e))
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
