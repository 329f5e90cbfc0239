use crate::domain::ConnectionStatus;
use crate::error::WalletError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    Connect,
    Retry,
    Established,
    Fail,
    Restore,
    Update,
    Teardown,
}

impl ConnectionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionAction::Connect => "connect",
            ConnectionAction::Retry => "retry",
            ConnectionAction::Established => "established",
            ConnectionAction::Fail => "fail",
            ConnectionAction::Restore => "restore",
            ConnectionAction::Update => "update",
            ConnectionAction::Teardown => "teardown",
        }
    }
}

pub fn connection_transition(
    from: ConnectionStatus,
    action: ConnectionAction,
) -> Result<(ConnectionStatus, &'static str), WalletError> {
    use ConnectionAction as A;
    use ConnectionStatus as S;

    let next = match (from, action) {
        (S::Idle | S::Error, A::Connect) => (S::Connecting, "connect_requested"),
        (S::Connecting, A::Retry) => (S::Connecting, "transient_retry"),
        (S::Connecting, A::Established) => (S::Connected, "wallet_approved"),
        (S::Connecting, A::Fail) => (S::Error, "connect_failed"),
        (S::Idle, A::Restore) => (S::Connected, "session_restored"),
        (S::Connected, A::Update) => (S::Connected, "provider_update"),
        (S::Connecting | S::Connected | S::Error, A::Teardown) => (S::Idle, "teardown"),
        _ => {
            return Err(WalletError::IllegalTransition {
                from,
                action: action.as_str(),
            })
        }
    };
    Ok(next)
}
