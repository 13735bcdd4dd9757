use std::io::BufRead;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{unbounded, RecvTimeoutError};
use tracing_subscriber::EnvFilter;

use belt_velocity_control::async_impl::{spawn_interrupt_listener, spawn_tokio_ticker};
use belt_velocity_control::threaded_impl::{spawn_controller_thread, spawn_tick_thread};
use belt_velocity_control::{
    ControlChannels, ControlLoop, DeadlineMonitor, Error, FaultLog, Motor, PlotExporter, Result,
    SimulatedBelt, StatusBoard, SystemConfig, TimerKind, TimingMetrics,
};

enum OperatorInput {
    Start,
    Stop,
    Exit,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        tracing::error!(error = %e, "belt controller failed");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/belt_control.toml".to_string());
    let cfg = SystemConfig::load(&path)?;

    println!("===========================================");
    println!("Belt Velocity Controller");
    println!("===========================================");
    println!("Commands: s = start, q = stop, x = exit (or Ctrl-C)\n");

    let belt = SimulatedBelt::realtime(&cfg.simulation);
    let status_motor = belt.motor();
    let channels = ControlChannels::new(cfg.controller.queue_capacity);
    let operator = channels.operator();
    let metrics = TimingMetrics::new();
    let faults = FaultLog::default();
    let status = StatusBoard::new();
    let monitor = DeadlineMonitor::new(
        metrics.clone(),
        faults.clone(),
        cfg.controller.period(),
        cfg.controller.deadline_miss_alarm,
    );

    let control = ControlLoop::new(
        cfg.controller.clone(),
        belt.encoder(),
        belt.motor(),
        PlotExporter::new(&cfg.runtime.plot_dir, cfg.runtime.plot_pid_actions),
    )?
    .with_metrics(metrics.clone())
    .with_fault_log(faults.clone())
    .with_status_board(status.clone());

    let controller =
        spawn_controller_thread(control, channels.command_rx.clone(), monitor.clone())?;

    let stop_ticks: Box<dyn FnOnce()> = match cfg.runtime.timer {
        TimerKind::Thread => {
            let (handle, stats) = spawn_tick_thread(channels.command_tx.clone(), monitor)?;
            Box::new(move || {
                stats.shutdown.store(true, Ordering::Relaxed);
                let _ = handle.join();
            })
        }
        TimerKind::Tokio => {
            let (handle, shutdown) = spawn_tokio_ticker(channels.command_tx.clone(), monitor)?;
            Box::new(move || {
                shutdown.store(true, Ordering::Relaxed);
                let _ = handle.join();
            })
        }
    };

    // Keyboard stands in for the start/stop buttons
    let (input_tx, input_rx) = unbounded();
    // Ctrl-C behaves like `x`: stop the run, export it and shut down
    spawn_interrupt_listener(input_tx.clone(), OperatorInput::Exit)?;
    thread::Builder::new()
        .name("operator-input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let input = match line.trim() {
                    "s" => OperatorInput::Start,
                    "q" => OperatorInput::Stop,
                    "x" => OperatorInput::Exit,
                    other => {
                        println!("Unknown command {:?} (s = start, q = stop, x = exit)", other);
                        continue;
                    }
                };
                if input_tx.send(input).is_err() {
                    break;
                }
            }
        })?;

    if cfg.runtime.autostart {
        operator.notify_start()?;
    }

    let started = Instant::now();
    let deadline = (cfg.runtime.run_seconds > 0)
        .then(|| started + Duration::from_secs(cfg.runtime.run_seconds));
    let status_interval = Duration::from_millis(cfg.runtime.status_interval_ms.max(1));
    let limit = cfg.controller.command_limit;

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            println!("Run time elapsed");
            break;
        }

        match input_rx.recv_timeout(status_interval) {
            Ok(OperatorInput::Start) => {
                println!("Keyboard: start pressed (s)");
                operator.notify_start()?;
            }
            Ok(OperatorInput::Stop) => {
                println!("Keyboard: stop pressed (q)");
                operator.notify_stop()?;
            }
            Ok(OperatorInput::Exit) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                let snapshot = status.get();
                println!(
                    "[{:7.3}s] {} | Position [mm]: {:9.2} | Velocity [mm/s]: {:7.2} | Voltage [%]: {:6.2}",
                    started.elapsed().as_secs_f64(),
                    snapshot.run_state,
                    snapshot.position,
                    snapshot.velocity,
                    status_motor.voltage() * 100.0 / limit
                );
            }
        }
    }

    // Silence the tick source first so nothing queues behind the shutdown
    stop_ticks();
    operator.shutdown()?;
    let mut control = controller.join().map_err(|_| Error::ControllerPanicked)?;
    control.sink_mut().wait();

    let report = metrics.report();
    println!("\n===========================================");
    println!("FINAL CONTROLLER RESULTS");
    println!("===========================================");
    println!("Runs completed: {}", control.runs_completed());
    println!("Ticks processed: {} ({} while idle)", report.ticks, report.idle_ticks);
    println!(
        "Deadline Compliance: {:.2}% ({} missed, {} dropped)",
        report.compliance(),
        report.deadline_misses,
        report.dropped_ticks
    );
    println!(
        "I/O failures: {} ({} forced stops)",
        report.io_failures, report.forced_stops
    );
    println!(
        "Tick execution P50: {:?}, P99: {:?}, max: {:?}",
        report.execution_p50, report.execution_p99, report.execution_max
    );
    println!(
        "Tick latency P50: {:?}, P99: {:?}",
        report.latency_p50, report.latency_p99
    );
    println!(
        "Period jitter P50: {:?}, P99: {:?}",
        report.jitter_p50, report.jitter_p99
    );
    for event in faults.read_all().iter().rev().take(5) {
        println!("  recent fault: {}", event.kind);
    }

    Ok(())
}
