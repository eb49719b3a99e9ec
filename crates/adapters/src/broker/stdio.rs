// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-oriented broker over a reader and a writer (stdin/stdout by default).
//!
//! Every input line is one message on the subscribed topic. Every produced
//! payload is written as one output line. End of input is reported once as
//! [`BrokerError::EndOfPartition`] and then the consumer stays idle.

use super::{Broker, BrokerConsumer, BrokerError, BrokerProducer, Message};
use async_trait::async_trait;
use evp_core::ClientConfig;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

type Reader = Box<dyn AsyncBufRead + Unpin + Send>;
type Writer = Box<dyn AsyncWrite + Unpin + Send>;
type LineResult = std::io::Result<String>;

/// Lines read ahead of the consumer
const LINE_BUFFER: usize = 64;

/// Where input lines come from
enum Source {
    /// The process's stdin, read on a dedicated thread. A blocking stdin
    /// read cannot be cancelled, so it must not run on the runtime's
    /// blocking pool or shutdown would wait for it.
    Stdin,
    Stream(Reader),
}

impl Source {
    /// Start feeding lines into a channel; the channel closes at end of input
    fn spawn(self) -> Result<mpsc::Receiver<LineResult>, BrokerError> {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        match self {
            Source::Stdin => {
                std::thread::Builder::new()
                    .name("evp-stdin".to_string())
                    .spawn(move || {
                        for line in std::io::stdin().lock().lines() {
                            let failed = line.is_err();
                            if tx.blocking_send(line).is_err() || failed {
                                break;
                            }
                        }
                    })
                    .map_err(|e| BrokerError::Transport(e.to_string()))?;
            }
            Source::Stream(reader) => {
                tokio::spawn(async move {
                    let mut lines = reader.lines();
                    loop {
                        let line = match lines.next_line().await {
                            Ok(Some(line)) => Ok(line),
                            Ok(None) => break,
                            Err(e) => Err(e),
                        };
                        let failed = line.is_err();
                        if tx.send(line).await.is_err() || failed {
                            break;
                        }
                    }
                });
            }
        }
        Ok(rx)
    }
}

/// Broker reading messages from one stream and writing results to another
#[derive(Clone)]
pub struct StdioBroker {
    source: Arc<Mutex<Option<Source>>>,
    writer: Arc<Mutex<Option<Writer>>>,
    exhausted: Arc<AtomicBool>,
}

impl StdioBroker {
    /// Broker over the process's stdin and stdout
    pub fn new() -> Self {
        Self::with_source(Source::Stdin, Box::new(tokio::io::stdout()))
    }

    /// Broker over arbitrary streams
    pub fn with_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::with_source(Source::Stream(Box::new(reader)), Box::new(writer))
    }

    fn with_source(source: Source, writer: Writer) -> Self {
        Self {
            source: Arc::new(Mutex::new(Some(source))),
            writer: Arc::new(Mutex::new(Some(writer))),
            exhausted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the consumer has read to the end of its input
    pub fn input_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }
}

impl Default for StdioBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for StdioBroker {
    type Consumer = StdioConsumer;
    type Producer = StdioProducer;

    async fn connect_consumer(&self, _config: &ClientConfig) -> Result<StdioConsumer, BrokerError> {
        let source = self
            .source
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or_else(|| BrokerError::Config("input stream already claimed".to_string()))?;
        Ok(StdioConsumer {
            lines: tokio::sync::Mutex::new(source.spawn()?),
            topic: Mutex::new(String::new()),
            offset: AtomicI64::new(0),
            exhausted: Arc::clone(&self.exhausted),
            closed: AtomicBool::new(false),
        })
    }

    async fn connect_producer(&self, _config: &ClientConfig) -> Result<StdioProducer, BrokerError> {
        let writer = self
            .writer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or_else(|| BrokerError::Config("output stream already claimed".to_string()))?;
        Ok(StdioProducer {
            writer: tokio::sync::Mutex::new(writer),
        })
    }
}

/// Consumer reading one message per line
pub struct StdioConsumer {
    lines: tokio::sync::Mutex<mpsc::Receiver<LineResult>>,
    topic: Mutex<String>,
    offset: AtomicI64,
    exhausted: Arc<AtomicBool>,
    closed: AtomicBool,
}

#[async_trait]
impl BrokerConsumer for StdioConsumer {
    async fn subscribe(&self, topics: &[String]) -> Result<(), BrokerError> {
        let [topic] = topics else {
            return Err(BrokerError::Config(format!(
                "stdio consumer reads exactly one topic, got {}",
                topics.len()
            )));
        };
        *self.topic.lock().unwrap_or_else(|e| e.into_inner()) = topic.clone();
        Ok(())
    }

    async fn poll(&self, timeout: Duration) -> Option<Result<Message, BrokerError>> {
        if self.closed.load(Ordering::Acquire) {
            return Some(Err(BrokerError::Closed));
        }
        if self.exhausted.load(Ordering::Acquire) {
            tokio::time::sleep(timeout).await;
            return None;
        }

        let mut lines = self.lines.lock().await;
        // recv is cancel safe, so a timed-out poll loses no line
        match tokio::time::timeout(timeout, lines.recv()).await {
            Err(_) => None,
            Ok(Some(Ok(line))) => {
                let topic = self.topic.lock().unwrap_or_else(|e| e.into_inner()).clone();
                let offset = self.offset.fetch_add(1, Ordering::SeqCst);
                Some(Ok(Message::new(topic, line).at_offset(offset)))
            }
            Ok(None) => {
                self.exhausted.store(true, Ordering::Release);
                Some(Err(BrokerError::EndOfPartition))
            }
            Ok(Some(Err(e))) => Some(Err(BrokerError::Transport(e.to_string()))),
        }
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.closed.store(true, Ordering::Release);
        self.lines.lock().await.close();
        Ok(())
    }
}

/// Producer writing one payload per line
pub struct StdioProducer {
    writer: tokio::sync::Mutex<Writer>,
}

#[async_trait]
impl BrokerProducer for StdioProducer {
    async fn produce(&self, _topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let mut writer = self.writer.lock().await;
        let mut line = payload;
        line.push(b'\n');
        writer
            .write_all(&line)
            .await
            .map_err(|e| BrokerError::Transport(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| BrokerError::Transport(e.to_string()))
    }

    async fn poll(&self, _timeout: Duration) {
        // Writes complete synchronously in produce; nothing to serve.
    }

    async fn flush(&self, timeout: Duration) -> Result<(), BrokerError> {
        let mut writer = self.writer.lock().await;
        match tokio::time::timeout(timeout, writer.flush()).await {
            Ok(result) => result.map_err(|e| BrokerError::Transport(e.to_string())),
            Err(_) => Err(BrokerError::Transport(format!(
                "flush timed out after {:?}",
                timeout
            ))),
        }
    }
}

#[cfg(test)]
#[path = "stdio_tests.rs"]
mod tests;
