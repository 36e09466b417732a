//! Event kinds and payload keys carried by messages.

use serde::{Deserialize, Serialize};

use super::MessageChannel;

/// Kind of event carried by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelEvent {
    AccountAdd,
    AccountAddFailed,
    AccountModify,
    AccountModifyFailed,
    AccountRemove,
    AccountRemoveFailed,
    AccountSecurityAdd,
    AccountSecurityRemove,
    BudgetAdd,
    BudgetModify,
    BudgetRemove,
    BudgetGoalUpdate,
    CommodityAdd,
    CommodityModify,
    CommodityRemove,
    CurrencyAdd,
    CurrencyModify,
    CurrencyRemove,
    ExchangeRateAdd,
    ExchangeRateRemove,
    SecurityAdd,
    SecurityModify,
    SecurityRemove,
    SecurityHistoryAdd,
    SecurityHistoryRemove,
    ConfigModify,
    ReminderAdd,
    ReminderRemove,
    TransactionAdd,
    TransactionRemove,
    FileClosing,
    FileIoError,
    FileLoadFailed,
    FileLoadSuccess,
    FileNewSuccess,
    FileNotFound,
    BackgroundProcessStarted,
    BackgroundProcessStopped,
    UiRestartRequired,
    /// The remote peer is going away.
    RemoteShutdown,
}

impl ChannelEvent {
    /// The channel this event is normally posted on
    pub fn default_channel(&self) -> MessageChannel {
        use ChannelEvent::*;
        match self {
            AccountAdd | AccountAddFailed | AccountModify | AccountModifyFailed | AccountRemove
            | AccountRemoveFailed | AccountSecurityAdd | AccountSecurityRemove => {
                MessageChannel::Account
            }
            BudgetAdd | BudgetModify | BudgetRemove | BudgetGoalUpdate => MessageChannel::Budget,
            CommodityAdd | CommodityModify | CommodityRemove | CurrencyAdd | CurrencyModify
            | CurrencyRemove | ExchangeRateAdd | ExchangeRateRemove | SecurityAdd
            | SecurityModify | SecurityRemove | SecurityHistoryAdd | SecurityHistoryRemove => {
                MessageChannel::Commodity
            }
            ConfigModify => MessageChannel::Config,
            ReminderAdd | ReminderRemove => MessageChannel::Reminder,
            TransactionAdd | TransactionRemove => MessageChannel::Transaction,
            FileClosing | FileIoError | FileLoadFailed | FileLoadSuccess | FileNewSuccess
            | FileNotFound | BackgroundProcessStarted | BackgroundProcessStopped
            | UiRestartRequired | RemoteShutdown => MessageChannel::System,
        }
    }

    /// Whether this event reports a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ChannelEvent::AccountAddFailed
                | ChannelEvent::AccountModifyFailed
                | ChannelEvent::AccountRemoveFailed
                | ChannelEvent::FileIoError
                | ChannelEvent::FileLoadFailed
                | ChannelEvent::FileNotFound
        )
    }
}

impl std::fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Keys of the message payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageProperty {
    Account,
    Budget,
    Commodity,
    Reminder,
    Transaction,
    Date,
    Description,
    Path,
}
