//! Background leaderboard dispatch
//!
//! Requests become jobs on a channel. In threaded mode a worker thread runs
//! them against the service and posts replies back; in inline mode they run
//! when the owner polls. Every job carries the [`Epochs`] current when it was
//! issued so the owner can discard replies that outlived their session.

use crossbeam_channel::{Receiver, Sender, unbounded};

use super::{
    LeaderboardEntry, LeaderboardError, LeaderboardService, OfflineLeaderboard, PlayerBest,
    SubmitOutcome,
};

/// Generation counters captured when a request is issued
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Epochs {
    /// Bumped by start, restart, return to menu and reset
    pub session: u64,
    /// Bumped only when lifetime data is reset
    pub profile: u64,
}

/// A leaderboard call
#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardRequest {
    Submit {
        player_name: String,
        score: u64,
        level: u32,
    },
    Fetch {
        limit: usize,
    },
    PlayerBest {
        player_name: String,
    },
}

/// Successful payload of a leaderboard call
#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardResponse {
    Submitted(SubmitOutcome),
    Entries(Vec<LeaderboardEntry>),
    PlayerBest(Option<PlayerBest>),
}

/// Outcome of one job
#[derive(Debug, Clone)]
pub struct LeaderboardReply {
    pub epochs: Epochs,
    pub request: LeaderboardRequest,
    pub result: Result<LeaderboardResponse, LeaderboardError>,
}

#[derive(Debug)]
struct Job {
    epochs: Epochs,
    request: LeaderboardRequest,
}

/// How jobs are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// On a dedicated worker thread (native only)
    Threaded,
    /// On the polling thread, during `poll`
    Inline,
}

enum Worker {
    #[cfg(not(target_arch = "wasm32"))]
    Thread {
        replies: Receiver<LeaderboardReply>,
    },
    Inline {
        jobs: Receiver<Job>,
        service: Box<dyn LeaderboardService>,
    },
}

/// Runs leaderboard jobs off the frame loop
pub struct LeaderboardDispatcher {
    jobs: Sender<Job>,
    worker: Worker,
    in_flight: usize,
}

impl std::fmt::Debug for LeaderboardDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaderboardDispatcher")
            .field("mode", &self.mode())
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

fn execute(service: &mut dyn LeaderboardService, job: Job) -> LeaderboardReply {
    let result = match &job.request {
        LeaderboardRequest::Submit {
            player_name,
            score,
            level,
        } => service
            .submit_score(player_name, *score, *level)
            .map(LeaderboardResponse::Submitted),
        LeaderboardRequest::Fetch { limit } => service
            .get_leaderboard(*limit)
            .map(LeaderboardResponse::Entries),
        LeaderboardRequest::PlayerBest { player_name } => service
            .get_player_best(player_name)
            .map(LeaderboardResponse::PlayerBest),
    };
    if let Err(e) = &result {
        log::warn!("Leaderboard request failed: {e}");
    }
    LeaderboardReply {
        epochs: job.epochs,
        request: job.request,
        result,
    }
}

impl LeaderboardDispatcher {
    /// Run jobs on a background thread
    #[cfg(not(target_arch = "wasm32"))]
    pub fn threaded(service: impl LeaderboardService + Send + 'static) -> Self {
        let (jobs, job_rx) = unbounded::<Job>();
        let (reply_tx, replies) = unbounded();
        let mut service = service;
        let spawned = std::thread::Builder::new()
            .name("leaderboard".into())
            .spawn(move || {
                for job in job_rx {
                    if reply_tx.send(execute(&mut service, job)).is_err() {
                        break;
                    }
                }
                log::debug!("Leaderboard worker stopped");
            });
        if let Err(e) = spawned {
            log::warn!("Leaderboard worker failed to start ({e}), running offline");
            return Self::offline();
        }
        Self {
            jobs,
            worker: Worker::Thread { replies },
            in_flight: 0,
        }
    }

    /// Run jobs when polled
    pub fn inline(service: impl LeaderboardService + 'static) -> Self {
        let (jobs, job_rx) = unbounded();
        Self {
            jobs,
            worker: Worker::Inline {
                jobs: job_rx,
                service: Box::new(service),
            },
            in_flight: 0,
        }
    }

    /// Every request fails as unavailable
    pub fn offline() -> Self {
        Self::inline(OfflineLeaderboard)
    }

    pub fn mode(&self) -> DispatchMode {
        match self.worker {
            #[cfg(not(target_arch = "wasm32"))]
            Worker::Thread { .. } => DispatchMode::Threaded,
            Worker::Inline { .. } => DispatchMode::Inline,
        }
    }

    /// Jobs issued whose replies have not been polled yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Queue a request. Never blocks.
    pub fn request(&mut self, epochs: Epochs, request: LeaderboardRequest) {
        log::debug!("Leaderboard request: {request:?}");
        if self.jobs.send(Job { epochs, request }).is_err() {
            log::warn!("Leaderboard worker gone, request dropped");
            return;
        }
        self.in_flight += 1;
    }

    /// Collect every reply that is ready
    pub fn poll(&mut self) -> Vec<LeaderboardReply> {
        let replies: Vec<LeaderboardReply> = match &mut self.worker {
            #[cfg(not(target_arch = "wasm32"))]
            Worker::Thread { replies } => replies.try_iter().collect(),
            Worker::Inline { jobs, service } => jobs
                .try_iter()
                .map(|job| execute(service.as_mut(), job))
                .collect(),
        };
        self.in_flight = self.in_flight.saturating_sub(replies.len());
        replies
    }

    /// Block until one reply is ready or `timeout` passes
    #[cfg(not(target_arch = "wasm32"))]
    pub fn wait(&mut self, timeout: std::time::Duration) -> Option<LeaderboardReply> {
        let reply = match &mut self.worker {
            Worker::Thread { replies } => replies.recv_timeout(timeout).ok(),
            Worker::Inline { jobs, service } => jobs
                .try_recv()
                .ok()
                .map(|job| execute(service.as_mut(), job)),
        };
        if reply.is_some() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::InMemoryLeaderboard;
    use std::time::Duration;

    fn submit(score: u64) -> LeaderboardRequest {
        LeaderboardRequest::Submit {
            player_name: "Ace".into(),
            score,
            level: 1,
        }
    }

    #[test]
    fn test_inline_runs_on_poll() {
        let mut d = LeaderboardDispatcher::inline(InMemoryLeaderboard::new());
        assert_eq!(d.mode(), DispatchMode::Inline);
        let epochs = Epochs {
            session: 3,
            profile: 1,
        };
        d.request(epochs, submit(50));
        d.request(epochs, LeaderboardRequest::Fetch { limit: 10 });
        assert_eq!(d.in_flight(), 2);

        let replies = d.poll();
        assert_eq!(replies.len(), 2);
        assert_eq!(d.in_flight(), 0);
        assert_eq!(replies[0].epochs, epochs);
        assert!(matches!(
            replies[0].result,
            Ok(LeaderboardResponse::Submitted(SubmitOutcome { rank: 1 }))
        ));
        match &replies[1].result {
            Ok(LeaderboardResponse::Entries(entries)) => assert_eq!(entries.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
        assert!(d.poll().is_empty());
    }

    #[test]
    fn test_offline_replies_with_error() {
        let mut d = LeaderboardDispatcher::offline();
        d.request(Epochs::default(), submit(10));
        let replies = d.poll();
        assert!(matches!(
            replies[0].result,
            Err(LeaderboardError::Unavailable(_))
        ));
    }

    /// Service that takes a while to answer
    struct SlowService(InMemoryLeaderboard);

    impl LeaderboardService for SlowService {
        fn submit_score(
            &mut self,
            name: &str,
            score: u64,
            level: u32,
        ) -> Result<SubmitOutcome, LeaderboardError> {
            std::thread::sleep(Duration::from_millis(50));
            self.0.submit_score(name, score, level)
        }
        fn get_leaderboard(&mut self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
            self.0.get_leaderboard(limit)
        }
        fn get_player_best(&mut self, name: &str) -> Result<Option<PlayerBest>, LeaderboardError> {
            self.0.get_player_best(name)
        }
    }

    #[test]
    fn test_threaded_does_not_block_caller() {
        let mut d = LeaderboardDispatcher::threaded(SlowService(InMemoryLeaderboard::new()));
        assert_eq!(d.mode(), DispatchMode::Threaded);
        d.request(Epochs::default(), submit(10));
        // The worker is still sleeping
        assert!(d.poll().is_empty());
        assert_eq!(d.in_flight(), 1);

        let reply = d.wait(Duration::from_secs(5)).expect("reply");
        assert!(reply.result.is_ok());
        assert_eq!(d.in_flight(), 0);
    }
}
