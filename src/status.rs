//! 操作ごとの処理状態とリクエスト連番

/// 1操作の状態
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OpStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(String),
}

impl OpStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, OpStatus::Pending)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OpStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// 発行済みリクエストの番号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// 単調増加の連番。最新以外のレスポンスは捨てる。
#[derive(Debug, Default)]
pub struct RequestSeq {
    latest: u64,
}

impl RequestSeq {
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}
