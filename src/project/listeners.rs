//! 再読み込みリスナーの登録と通知

use super::ProjectStore;
use crate::error::Result;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub type ReloadListener = Arc<dyn Fn(&ProjectStore) -> Result<()> + Send + Sync>;

/// 登録解除用のID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub(super) struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, ReloadListener)>>,
}

impl ListenerRegistry {
    pub(super) fn add(&self, listener: ReloadListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, listener));
        id
    }

    pub(super) fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub(super) fn len(&self) -> usize {
        self.lock().len()
    }

    /// 全リスナーへ通知
    ///
    /// 通知中の登録・解除でデッドロックしないよう、一覧を複製してから呼ぶ。
    /// エラーやパニックはログに残して次のリスナーへ進む。
    pub(super) fn notify(&self, store: &ProjectStore) {
        let listeners: Vec<(ListenerId, ReloadListener)> = self.lock().clone();

        for (id, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(store))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(listener = ?id, error = %e, "Project reload listener failed");
                }
                Err(_) => {
                    tracing::warn!(listener = ?id, "Project reload listener panicked");
                }
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, ReloadListener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
