//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use crate::config::Config;
use crate::error::{ItemError, Result};
use crate::handler::RequestHandler;
use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Cloneable handle that stops a running server
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server for ItemKV
pub struct Server {
    config: Config,
    handler: Arc<RequestHandler>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Bind the configured listen address
    pub fn bind(config: Config, handler: Arc<RequestHandler>) -> Result<Self> {
        if config.worker_threads == 0 {
            return Err(ItemError::Config("worker_threads must be at least 1".to_string()));
        }

        let listener = TcpListener::bind(&config.listen_addr)
            .map_err(|e| ItemError::Network(format!("bind {}: {}", config.listen_addr, e)))?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            handler,
            listener,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
            },
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Start the server (blocking until shutdown)
    ///
    /// Accepted connections are queued to a fixed pool of workers. On
    /// shutdown the queue is closed and workers finish their current
    /// connection before exiting.
    pub fn run(&self) -> Result<()> {
        let (tx, rx) = channel::unbounded::<TcpStream>();

        let workers: Vec<JoinHandle<()>> = (0..self.config.worker_threads)
            .map(|i| self.spawn_worker(i, rx.clone()))
            .collect::<Result<_>>()?;

        tracing::info!(
            "Listening on {} with {} workers",
            self.local_addr()?,
            workers.len()
        );

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::trace!("Accepted {}", addr);
                    stream.set_nonblocking(false)?;
                    if tx.send(stream).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                }
            }
        }

        drop(tx);
        for worker in workers {
            let _ = worker.join();
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    fn spawn_worker(&self, index: usize, rx: Receiver<TcpStream>) -> Result<JoinHandle<()>> {
        let handler = Arc::clone(&self.handler);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        let handle = thread::Builder::new()
            .name(format!("itemkv-worker-{}", index))
            .spawn(move || {
                for stream in rx.iter() {
                    let mut connection = match Connection::new(stream, Arc::clone(&handler)) {
                        Ok(c) => c,
                        Err(e) => {
                            tracing::warn!("Failed to set up connection: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
                        tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
                        continue;
                    }
                    if let Err(e) = connection.handle() {
                        tracing::debug!("Connection {} ended with error: {}", connection.peer_addr(), e);
                    }
                }
            })?;

        Ok(handle)
    }
}
