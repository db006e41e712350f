//! Render worker pool.
//!
//! A fixed set of named threads pulls [`Instruction`]s from one shared
//! queue. Each instruction carries its own result channel and a
//! [`CompletionToken`]; the dispatcher waits on the matching [`JoinCounter`]
//! before it drains the results, so a stage never starts on a partial set.
//! Results arrive in no particular order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use super::context::FrameContext;
use super::triangle::ProjectedTriangle;
use crate::error::{Error, Result};
use crate::face::Face;

/// Counts outstanding instructions of one batch.
#[derive(Clone, Debug, Default)]
pub struct JoinCounter {
    state: Arc<(Mutex<usize>, Condvar)>,
}

impl JoinCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more pending completion.
    pub fn token(&self) -> CompletionToken {
        let (count, _) = &*self.state;
        *count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        CompletionToken {
            state: Arc::clone(&self.state),
        }
    }

    pub fn pending(&self) -> usize {
        *self.state.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until every token handed out so far has been dropped.
    pub fn wait(&self) {
        let (count, done) = &*self.state;
        let mut pending = count.lock().unwrap_or_else(PoisonError::into_inner);
        while *pending > 0 {
            pending = done.wait(pending).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Signals completion of one instruction when dropped, including when the
/// work panicked.
#[derive(Debug)]
pub struct CompletionToken {
    state: Arc<(Mutex<usize>, Condvar)>,
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        let (count, done) = &*self.state;
        let mut pending = count.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            done.notify_all();
        }
    }
}

pub enum Instruction {
    /// Forward every face that may be visible.
    FrustumTest {
        frame: Arc<FrameContext>,
        faces: Vec<Face>,
        results: Sender<Face>,
        done: CompletionToken,
    },
    /// Clip, project and triangulate one face.
    ClipAndProject {
        frame: Arc<FrameContext>,
        face: Face,
        results: Sender<ProjectedTriangle>,
        done: CompletionToken,
    },
    Terminate,
}

impl Instruction {
    /// Runs the work. Send failures mean the collector gave up and are
    /// ignored. The completion token drops on return.
    fn execute(self) {
        match self {
            Instruction::FrustumTest {
                frame,
                faces,
                results,
                done: _done,
            } => {
                for face in faces {
                    if frame.projector.face_overlaps_frustum(&face) && results.send(face).is_err() {
                        break;
                    }
                }
            }
            Instruction::ClipAndProject {
                frame,
                face,
                results,
                done: _done,
            } => {
                let eye = frame.projector.position;
                for clipped in frame.projector.clip_and_project_face(&face) {
                    let triangle = ProjectedTriangle::from_clipped(clipped, &face, eye);
                    if results.send(triangle).is_err() {
                        break;
                    }
                }
            }
            Instruction::Terminate => {}
        }
    }
}

struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

pub struct WorkerPool {
    sender: Sender<Instruction>,
    workers: Vec<Worker>,
    processed: Arc<Vec<AtomicUsize>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidWorkerCount);
        }

        let (sender, receiver) = mpsc::channel::<Instruction>();
        let receiver = Arc::new(Mutex::new(receiver));
        let processed: Arc<Vec<AtomicUsize>> =
            Arc::new((0..size).map(|_| AtomicUsize::new(0)).collect());

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let receiver = Arc::clone(&receiver);
            let processed = Arc::clone(&processed);
            let handle = thread::Builder::new()
                .name(format!("render-worker-{id}"))
                .spawn(move || run_worker(id, &receiver, &processed))
                .map_err(Error::WorkerSpawn)?;
            workers.push(Worker {
                id,
                handle: Some(handle),
            });
        }
        log::debug!("render worker pool started with {size} workers");

        Ok(Self {
            sender,
            workers,
            processed,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues an instruction. If no worker is left to take it, the
    /// instruction runs on the calling thread instead.
    pub fn dispatch(&self, instruction: Instruction) {
        if let Err(SendError(instruction)) = self.sender.send(instruction) {
            instruction.execute();
        }
    }

    /// Instructions handled so far, per worker.
    pub fn processed_counts(&self) -> Vec<usize> {
        self.processed
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect()
    }

    /// Frustum-tests `faces` in batches and returns those that may be visible.
    pub fn frustum_test(
        &self,
        frame: &Arc<FrameContext>,
        faces: Vec<Face>,
        batch_size: usize,
    ) -> Vec<Face> {
        let (results, collected) = mpsc::channel();
        let join = JoinCounter::new();

        let mut faces = faces.into_iter().peekable();
        while faces.peek().is_some() {
            let batch: Vec<Face> = faces.by_ref().take(batch_size.max(1)).collect();
            self.dispatch(Instruction::FrustumTest {
                frame: Arc::clone(frame),
                faces: batch,
                results: results.clone(),
                done: join.token(),
            });
        }
        drain(results, &join, collected)
    }

    /// Clips and projects every face and returns the resulting triangles.
    pub fn clip_and_project(
        &self,
        frame: &Arc<FrameContext>,
        faces: Vec<Face>,
    ) -> Vec<ProjectedTriangle> {
        let (results, collected) = mpsc::channel();
        let join = JoinCounter::new();

        for face in faces {
            self.dispatch(Instruction::ClipAndProject {
                frame: Arc::clone(frame),
                face,
                results: results.clone(),
                done: join.token(),
            });
        }
        drain(results, &join, collected)
    }
}

/// Waits for a batch, closes the dispatcher's end of its channel and
/// collects everything the workers sent.
fn drain<T>(results: Sender<T>, join: &JoinCounter, collected: Receiver<T>) -> Vec<T> {
    drop(results);
    join.wait();
    collected.into_iter().collect()
}

fn run_worker(id: usize, receiver: &Mutex<Receiver<Instruction>>, processed: &[AtomicUsize]) {
    loop {
        let instruction = {
            let queue = receiver.lock().unwrap_or_else(PoisonError::into_inner);
            queue.recv()
        };
        match instruction {
            Ok(Instruction::Terminate) | Err(_) => break,
            Ok(instruction) => {
                // counted first so the total is complete once a batch joins
                processed[id].fetch_add(1, Ordering::Relaxed);
                instruction.execute();
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for _ in &self.workers {
            let _ = self.sender.send(Instruction::Terminate);
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    log::warn!("render worker {} panicked", worker.id);
                }
            }
        }
        log::debug!("render workers stopped, processed {:?}", self.processed_counts());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::config::RenderToggles;
    use crate::math::Vec3;
    use std::time::Duration;

    fn frame() -> Arc<FrameContext> {
        let mut camera = Camera::default();
        Arc::new(FrameContext {
            width: 100,
            height: 100,
            background: crate::colors::WHITE,
            toggles: RenderToggles::default(),
            projector: *camera.update(100, 100),
        })
    }

    fn face_at(z: f64) -> Face {
        Face::plain([
            Vec3::new(-1.0, -1.0, z),
            Vec3::new(1.0, -1.0, z),
            Vec3::new(0.0, 1.0, z),
        ])
    }

    #[test]
    fn zero_workers_is_an_error() {
        assert!(matches!(WorkerPool::new(0), Err(Error::InvalidWorkerCount)));
    }

    #[test]
    fn join_counter_waits_for_all_tokens() {
        let join = JoinCounter::new();
        let tokens: Vec<_> = (0..4).map(|_| join.token()).collect();
        assert_eq!(join.pending(), 4);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            drop(tokens);
        });
        join.wait();
        assert_eq!(join.pending(), 0);
        handle.join().unwrap();
    }

    #[test]
    fn frustum_test_keeps_only_faces_in_front() {
        let pool = WorkerPool::new(3).unwrap();
        let faces: Vec<Face> = (0..50)
            .map(|i| face_at(if i % 2 == 0 { -5.0 } else { 5.0 }))
            .collect();
        let visible = pool.frustum_test(&frame(), faces, 7);
        assert_eq!(visible.len(), 25);
        assert!(visible.iter().all(|f| f.vertices()[0].z < 0.0));
    }

    #[test]
    fn clip_and_project_collects_every_triangle() {
        let pool = WorkerPool::new(2).unwrap();
        let faces: Vec<Face> = (0..10).map(|_| face_at(-5.0)).collect();
        let triangles = pool.clip_and_project(&frame(), faces);
        assert_eq!(triangles.len(), 10);
        assert!(pool.processed_counts().iter().sum::<usize>() >= 10);
    }
}
