//! Host simulator: all three nodes on one PC.
//!
//! ```text
//!   SignalGenerator ─▶ TransmitterNode ─▶ LoopbackLink ─▶ ReceiverNode ─▶ log
//!   VoltageSweep ────▶ GuardNode ─▶ sim relay GPIO, alert sink (log or HTTP)
//! ```
//!
//! Runs in real time by default; `--fast` drives simulated time instead
//! so a long scenario finishes immediately.
#![deny(unused_must_use)]

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    host::run()
}

#[cfg(target_os = "espidf")]
fn main() {}

#[cfg(not(target_os = "espidf"))]
mod host {
    use anyhow::Result;
    use clap::{Parser, ValueEnum};
    use embedded_hal::delay::DelayNs;
    use log::info;
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::EnvFilter;

    use fenceguard::adapters::hardware::{GpioInput, GpioOutput};
    use fenceguard::adapters::http_sink::HttpAlertSink;
    use fenceguard::adapters::log_sink::{LogAlertSink, LogEventSink};
    use fenceguard::adapters::loopback::LoopbackLink;
    use fenceguard::adapters::time::{Esp32TimeAdapter, SimulatedTime, StdDelay};
    use fenceguard::adapters::wifi::WifiAdapter;
    use fenceguard::app::ports::{AlertSink, Clock, ConnectivityPort};
    use fenceguard::app::service::GuardService;
    use fenceguard::config::{FenceConfig, FirstEdgePolicy};
    use fenceguard::drivers::hw_init;
    use fenceguard::error::Error;
    use fenceguard::node::{GuardNode, ReceiverNode, TransmitterNode};
    use fenceguard::pins;
    use fenceguard::scheduler::{PeriodicTimer, PollLoop, PollNode};
    use fenceguard::sim::{SignalGenerator, SignalMode, VoltageSweep};

    #[derive(Debug, Clone, Copy, ValueEnum)]
    enum Mode {
        /// One 10 ms pulse per second.
        Legal,
        /// Line stuck high.
        Dc,
        /// 50 Hz toggling.
        Ac,
    }

    impl From<Mode> for SignalMode {
        fn from(m: Mode) -> Self {
            match m {
                Mode::Legal => SignalMode::LegalPulse,
                Mode::Dc => SignalMode::IllegalDc,
                Mode::Ac => SignalMode::IllegalAc,
            }
        }
    }

    #[derive(Parser)]
    #[command(name = "fence-sim", about = "Run the fence monitor nodes against simulated signals", version)]
    struct Cli {
        /// Simulated run length in seconds
        #[arg(long, default_value_t = 30)]
        seconds: u64,

        /// Pulse line pattern fed to the transmitter
        #[arg(long, value_enum, default_value_t = Mode::Legal)]
        mode: Mode,

        /// POST alerts to this URL instead of logging them
        #[arg(long, env = "FENCE_ALERT_URL")]
        alert_url: Option<String>,

        /// Press the tamper switch at this second (held for 1.5 s)
        #[arg(long)]
        tamper_at: Option<u64>,

        /// Suppress the first pulse instead of reporting it illegal
        #[arg(long)]
        suppress_first_edge: bool,

        /// Append `*HH` checksums to radio lines
        #[arg(long)]
        checksum: bool,

        /// Run on simulated time without waiting
        #[arg(long)]
        fast: bool,
    }

    const TAMPER_HOLD_MS: u64 = 1500;
    const SWEEP_SAMPLES_PER_PHASE: usize = 10;

    /// All three nodes behind one 1 ms poll step, each paced by its own
    /// interval.
    struct Bench<S: AlertSink> {
        signal_clock: SimulatedTime,
        tx: TransmitterNode<SignalGenerator<SimulatedTime>, LoopbackLink>,
        rx: ReceiverNode<LoopbackLink, LogEventSink>,
        guard: GuardNode<VoltageSweep, GpioInput, GpioOutput, S>,
        rx_timer: PeriodicTimer,
        guard_timer: PeriodicTimer,
        tamper_window: Option<(u64, u64)>,
    }

    impl<S: AlertSink> PollNode for Bench<S> {
        fn poll(&mut self, now_ms: u64) {
            self.signal_clock.set_ms(now_ms);
            if let Some((from, until)) = self.tamper_window {
                // Active-low switch: pressed pulls the line low.
                hw_init::sim_set_gpio(pins::TAMPER_GPIO, !(from..until).contains(&now_ms));
            }

            self.tx.poll(now_ms);
            if self.rx_timer.poll(now_ms) {
                self.rx.poll(now_ms);
            }
            if self.guard_timer.poll(now_ms) {
                self.guard.poll(now_ms);
            }
        }

        fn interval_ms(&self) -> u32 {
            self.tx.interval_ms()
        }

        fn name(&self) -> &'static str {
            "bench"
        }
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();

        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
            .with_target(false)
            .init();

        let config = FenceConfig {
            first_edge_policy: if cli.suppress_first_edge {
                FirstEdgePolicy::Suppress
            } else {
                FirstEdgePolicy::Alert
            },
            wire_checksum: cli.checksum,
            ..FenceConfig::default()
        };
        config.validate().map_err(Error::from)?;

        info!("FenceGuard simulator v{}", env!("CARGO_PKG_VERSION"));
        bring_up()?;
        hw_init::sim_set_gpio(pins::TAMPER_GPIO, true);

        match cli.alert_url.as_deref() {
            Some(url) => {
                let mut wifi = WifiAdapter::new();
                wifi.set_credentials("sim-network", "").map_err(Error::from)?;
                wifi.connect().map_err(Error::from)?;
                let sink = HttpAlertSink::new(url, config.http_timeout_ms, wifi);
                drive(&cli, config, sink)
            }
            None => drive(&cli, config, LogAlertSink::new()),
        }
    }

    /// Simulated peripheral bring-up for all three nodes.
    fn bring_up() -> fenceguard::error::Result<()> {
        hw_init::init_pulse_input()?;
        hw_init::init_guard_peripherals()?;
        Ok(())
    }

    fn drive<S: AlertSink>(cli: &Cli, config: FenceConfig, sink: S) -> Result<()> {
        let cycles = cli.seconds.saturating_mul(1000) / u64::from(config.pulse_poll_interval_ms);
        if cli.fast {
            let time = SimulatedTime::new();
            let bench = build(cli, config, sink, 0)?;
            finish(PollLoop::new(time.clone(), time, bench), cycles);
        } else {
            let clock = Esp32TimeAdapter::new();
            let bench = build(cli, config, sink, clock.now_ms())?;
            finish(PollLoop::new(clock, StdDelay, bench), cycles);
        }
        Ok(())
    }

    fn build<S: AlertSink>(cli: &Cli, config: FenceConfig, sink: S, start_ms: u64) -> Result<Bench<S>> {
        let signal_clock = SimulatedTime::starting_at(start_ms);
        let (tx_link, rx_link) = LoopbackLink::pair();
        let line = SignalGenerator::new(signal_clock.clone(), cli.mode.into());

        let tx = TransmitterNode::new(&config, line, tx_link, start_ms);
        let rx = ReceiverNode::new(&config, rx_link, LogEventSink::new());

        let adc = VoltageSweep::spike_and_recover(SWEEP_SAMPLES_PER_PHASE, &config);
        let rx_timer = PeriodicTimer::new(u64::from(config.receiver_poll_interval_ms), start_ms);
        let guard_timer = PeriodicTimer::new(u64::from(config.guard_poll_interval_ms), start_ms);
        let mut service = GuardService::new(config, adc, GpioInput::tamper(), GpioOutput::relay(), sink, start_ms);
        service.start()?;

        let tamper_window = cli.tamper_at.map(|s| {
            let from = start_ms + s * 1000;
            (from, from + TAMPER_HOLD_MS)
        });

        Ok(Bench {
            signal_clock,
            tx,
            rx,
            guard: GuardNode::new(service),
            rx_timer,
            guard_timer,
            tamper_window,
        })
    }

    fn finish<C: Clock, D: DelayNs, S: AlertSink>(mut lp: PollLoop<C, D, Bench<S>>, cycles: u64) {
        lp.run_cycles(cycles);
        let bench = lp.node();
        let pulses = bench.tx.pulse_stats();
        let rx = bench.rx.stats();
        let guard = bench.guard.service();
        let dispatch = guard.dispatch_stats();
        info!(
            "SUMMARY | pulses={} legal={} illegal={} | rx packets={} events={} unparseable={}",
            pulses.edges, pulses.legal, pulses.illegal, rx.packets, rx.events, rx.decode_failures
        );
        info!(
            "SUMMARY | guard={:?} relay={:?} tamper={} | alerts delivered={} failed={}",
            guard.state(),
            guard.relay_state(),
            guard.tamper_detections(),
            dispatch.delivered,
            dispatch.failed
        );
    }
}
