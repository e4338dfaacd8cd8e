//! 流式投递通道
//!
//! 把完整 Response 按空白分词逐片发给调用方（Chunk），结束时补一个携带全文的 Complete。
//! 取消是硬契约：令牌触发后不再发任何分片、不发 Complete，
//! 任务返回 false 让编排器跳过该轮的会话写入。

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::Response;

/// 流事件：逐片内容或终态全文
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Chunk(String),
    Complete(Response),
}

/// 启动流式投递；返回事件接收端与完成句柄（true=正常完成，false=被取消）
///
/// pacing 为相邻分片间的固定间隔，可配置为 0 直接倾泻。
pub fn stream_response(
    response: Response,
    pacing: Duration,
    token: CancellationToken,
) -> (mpsc::Receiver<StreamEvent>, JoinHandle<bool>) {
    let (tx, rx) = mpsc::channel(64);

    let handle = tokio::spawn(async move {
        let words: Vec<String> = response
            .content
            .split_whitespace()
            .map(|w| format!("{w} "))
            .collect();

        for (i, word) in words.into_iter().enumerate() {
            if token.is_cancelled() {
                return false;
            }
            if i > 0 && !pacing.is_zero() {
                tokio::select! {
                    _ = token.cancelled() => return false,
                    _ = tokio::time::sleep(pacing) => {}
                }
            }
            // 接收端关闭等同于取消
            if tx.send(StreamEvent::Chunk(word)).await.is_err() {
                return false;
            }
        }

        if token.is_cancelled() {
            return false;
        }
        let mut complete = response;
        complete.complete = true;
        tx.send(StreamEvent::Complete(complete)).await.is_ok()
    });

    (rx, handle)
}
