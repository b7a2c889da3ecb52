//! 再読み込み要求の間引き（同時に1件まで）
//!
//! 監視コールバックは短時間に何度も呼ばれる。保留中または実行中の
//! 再読み込みがある間の要求は捨て、完了後に次の要求を受け付ける。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

/// 再読み込み要求を出す側（監視スレッドなどへ複製して渡す）
#[derive(Debug, Clone)]
pub struct ReloadScheduler {
    in_flight: Arc<AtomicBool>,
    tx: Sender<ReloadTicket>,
}

/// 再読み込みを実行する側
#[derive(Debug)]
pub struct ReloadQueue {
    rx: Receiver<ReloadTicket>,
}

/// 1回分の再読み込み権
///
/// 破棄されると次の要求を受け付けるようになる。
#[derive(Debug)]
pub struct ReloadTicket {
    in_flight: Arc<AtomicBool>,
}

impl Drop for ReloadTicket {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

pub fn channel() -> (ReloadScheduler, ReloadQueue) {
    let (tx, rx) = mpsc::channel();
    let scheduler = ReloadScheduler {
        in_flight: Arc::new(AtomicBool::new(false)),
        tx,
    };
    (scheduler, ReloadQueue { rx })
}

impl ReloadScheduler {
    /// 再読み込みを要求
    ///
    /// 受け付けた場合は true。既に保留中・実行中なら何もせず false。
    pub fn request(&self) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let ticket = ReloadTicket {
            in_flight: Arc::clone(&self.in_flight),
        };
        // 受信側が無い場合は送れなかったチケットの破棄でフラグが戻る
        self.tx.send(ticket).is_ok()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl ReloadQueue {
    /// 次の再読み込み要求を待つ（送信側が全て無くなれば None）
    pub fn recv(&self) -> Option<ReloadTicket> {
        self.rx.recv().ok()
    }

    /// タイムアウト付きで待つ
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ReloadTicket> {
        match self.rx.recv_timeout(timeout) {
            Ok(ticket) => Some(ticket),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<ReloadTicket> {
        self.rx.try_recv().ok()
    }
}
