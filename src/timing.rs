//! Capped-rate render and tick loops.
//!
//! Rendering and ticking run on their own threads at independent rates,
//! both against a shared `Arc<RwLock<Scene>>`. Rendering takes the read
//! lock, ticking takes the write lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::scene::Scene;

/// How often a paused loop checks whether it was resumed or stopped.
const PAUSE_POLL: Duration = Duration::from_millis(50);

/// Keeps a loop at a target rate.
#[derive(Debug)]
pub struct RateLimiter {
    label: &'static str,
    interval: Option<Duration>,
    previous: Instant,
}

impl RateLimiter {
    /// `rate` is in iterations per second; `None` or a non-positive rate
    /// means no waiting.
    pub fn new(label: &'static str, rate: Option<f64>) -> Self {
        Self {
            label,
            interval: interval_for(rate),
            previous: Instant::now(),
        }
    }

    pub fn set_rate(&mut self, rate: Option<f64>) {
        self.interval = interval_for(rate);
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Sleeps out the rest of the current interval and returns the time
    /// since the previous call. Overruns are logged, never slept for.
    pub fn wait(&mut self) -> Duration {
        let mut elapsed = self.previous.elapsed();
        if let Some(interval) = self.interval {
            if elapsed < interval {
                thread::sleep(interval - elapsed);
                elapsed = self.previous.elapsed();
            } else if elapsed > interval {
                log::warn!(
                    "{} took too long: {:.2?} (budget {:.2?})",
                    self.label,
                    elapsed,
                    interval
                );
            }
        }
        self.previous = Instant::now();
        elapsed
    }
}

fn interval_for(rate: Option<f64>) -> Option<Duration> {
    rate.filter(|r| r.is_finite() && *r > 0.0)
        .map(|r| Duration::from_secs_f64(1.0 / r))
}

/// Handle to a loop thread. Dropping it stops and joins the loop.
pub struct LoopHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl LoopHandle {
    /// Asks the loop to exit after its current iteration.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the loop and waits for it to exit.
    pub fn join(mut self) -> thread::Result<()> {
        self.stop();
        self.thread.take().map_or(Ok(()), JoinHandle::join)
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("loop thread panicked");
            }
        }
    }
}

fn spawn_loop<F>(name: &str, mut body: F) -> Result<LoopHandle>
where
    F: FnMut(&AtomicBool) + Send + 'static,
{
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    let thread = thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || body(&flag))
        .map_err(Error::WorkerSpawn)?;
    Ok(LoopHandle {
        running,
        thread: Some(thread),
    })
}

/// Renders `scene` at its `fps_cap` and hands every frame to `on_frame`.
pub fn spawn_render_loop<F>(
    scene: Arc<RwLock<Scene>>,
    renderer: Renderer,
    mut on_frame: F,
) -> Result<LoopHandle>
where
    F: FnMut(RgbaImage) + Send + 'static,
{
    spawn_loop("render-loop", move |running| {
        let mut limiter = RateLimiter::new("frame", None);
        while running.load(Ordering::Acquire) {
            let (cap, image) = {
                let scene = scene.read().unwrap_or_else(PoisonError::into_inner);
                if scene.fps_cap == Some(0.0) {
                    (scene.fps_cap, None)
                } else {
                    (scene.fps_cap, Some(renderer.render(&*scene)))
                }
            };
            match image {
                Some(image) => on_frame(image),
                None => {
                    thread::sleep(PAUSE_POLL);
                    continue;
                }
            }
            limiter.set_rate(cap);
            limiter.wait();
        }
        log::debug!("render loop stopped");
    })
}

/// Ticks `scene` at its `tps_cap`.
pub fn spawn_tick_loop(scene: Arc<RwLock<Scene>>) -> Result<LoopHandle> {
    spawn_loop("tick-loop", move |running| {
        let mut limiter = RateLimiter::new("tick", None);
        while running.load(Ordering::Acquire) {
            let cap = {
                let mut scene = scene.write().unwrap_or_else(PoisonError::into_inner);
                if scene.tps_cap != Some(0.0) {
                    scene.tick();
                }
                scene.tps_cap
            };
            if cap == Some(0.0) {
                thread::sleep(PAUSE_POLL);
                continue;
            }
            limiter.set_rate(cap);
            limiter.wait();
        }
        log::debug!("tick loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;
    use crate::scene::SceneHost;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    #[test]
    fn limiter_waits_out_the_interval() {
        let mut limiter = RateLimiter::new("test", Some(50.0));
        assert_eq!(limiter.interval(), Some(Duration::from_millis(20)));
        limiter.wait();
        let start = Instant::now();
        let delta = limiter.wait();
        assert!(delta >= Duration::from_millis(19));
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn uncapped_and_paused_rates_never_sleep() {
        assert_eq!(RateLimiter::new("test", None).interval(), None);
        assert_eq!(RateLimiter::new("test", Some(0.0)).interval(), None);
        assert_eq!(RateLimiter::new("test", Some(f64::NAN)).interval(), None);
    }

    #[test]
    fn tick_loop_runs_callbacks_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut scene = Scene::new(16, 16);
        scene.tps_cap = Some(200.0);
        let counter = Arc::clone(&ticks);
        scene.register_tick(Box::new(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        let handle = spawn_tick_loop(Arc::new(RwLock::new(scene))).unwrap();
        thread::sleep(Duration::from_millis(100));
        handle.join().unwrap();
        assert!(ticks.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn render_loop_delivers_frames() {
        let mut scene = Scene::new(8, 8);
        scene.fps_cap = None;
        let mut config = RendererConfig::default();
        config.set_worker_count(1);
        let renderer = Renderer::new(config).unwrap();

        let (frames, received) = mpsc::channel();
        let handle = spawn_render_loop(Arc::new(RwLock::new(scene)), renderer, move |image| {
            let _ = frames.send(image.dimensions());
        })
        .unwrap();
        let first = received.recv_timeout(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
        assert_eq!(first, (8, 8));
    }
}
