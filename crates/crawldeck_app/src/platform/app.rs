use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use crawldeck_client::{
    lock_store, Credential, MutationCoordinator, Poller, Refresher, RemoteClient, ReqwestClient,
    SharedStore,
};
use crawldeck_core::{update, DeskState, Msg, ResultStore, SessionState, StoreEvent};
use deck_logging::{deck_info, deck_warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use super::commands::{self, Input, HELP};
use super::config::{self, AppConfig};
use super::effects::EffectRunner;
use super::render;

const TICK_INTERVAL: Duration = Duration::from_millis(250);

pub fn run_app() -> anyhow::Result<()> {
    let env = |key: &str| std::env::var(key).ok();
    let path = config::config_path(env);
    let (config, report) = config::load(&path);
    let config = config.with_env(env);

    deck_logging::initialize(
        config.log_destination(),
        config.log_level(),
        config.log_file.as_deref(),
    );
    report.log(&path);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(run(config))
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let credential = config
        .token
        .clone()
        .map(Credential::with_token)
        .unwrap_or_default();
    let client = ReqwestClient::new(&config.client_settings(), credential.clone())
        .context("invalid service configuration")?;
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        let auth = client
            .login(username, password)
            .await
            .context("login failed")?;
        deck_info!(
            "Signed in as {}",
            auth.user.map(|user| user.username).unwrap_or_default()
        );
    }
    if !client.is_authenticated() {
        deck_warn!("No credential configured; the service will reject requests");
    }
    let client: Arc<dyn RemoteClient> = Arc::new(client);

    let store: SharedStore = Arc::new(Mutex::new(ResultStore::new()));
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Msg>();
    forward_store_events(&store, msg_tx.clone());

    let refresher = Arc::new(Refresher::new(client.clone(), store.clone(), config.page_limit));
    let coordinator = Arc::new(
        MutationCoordinator::new(client, refresher.clone()).with_strategy(config.bulk),
    );
    let poller = Poller::spawn(refresher, config.poll_settings());

    let mut desk = Desk {
        state: DeskState::new(),
        runner: EffectRunner::new(coordinator, poller, msg_tx),
        credential,
        store,
        reported_failure: None,
    };
    println!("{}", render::render(&desk.state.view()));
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match commands::parse(&line) {
                    Ok(Input::Quit) => break,
                    Ok(input) => desk.handle_input(input).await,
                    Err(err) => println!("{err}"),
                }
            }
            Some(msg) = msg_rx.recv() => desk.dispatch(msg),
            _ = ticker.tick() => desk.tick(),
        }
    }

    deck_info!("Shutting down");
    Ok(())
}

/// Every store notification becomes a table message.
fn forward_store_events(store: &SharedStore, msg_tx: mpsc::UnboundedSender<Msg>) {
    lock_store(store).subscribe(move |event| {
        let msg = match event {
            StoreEvent::Replaced { revision, jobs } => Msg::StoreReplaced {
                revision: *revision,
                jobs: jobs.to_vec(),
            },
            StoreEvent::StatsUpdated(stats) => Msg::StatsUpdated(*stats),
        };
        let _ = msg_tx.send(msg);
    });
}

struct Desk {
    state: DeskState,
    runner: EffectRunner,
    credential: Credential,
    store: SharedStore,
    reported_failure: Option<String>,
}

impl Desk {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        let view = state.view();
        self.state = state;
        self.runner.enqueue(effects);
        if was_dirty {
            println!("{}", render::render(&view));
        }
    }

    async fn handle_input(&mut self, input: Input) {
        match input {
            Input::Msgs(msgs) => {
                for msg in msgs {
                    self.dispatch(msg);
                }
            }
            Input::Show => println!("{}", render::render(&self.state.view())),
            Input::Help => println!("{HELP}"),
            Input::Logout => {
                self.credential.clear();
                self.tick();
            }
            Input::Detail(id) => match self.runner.coordinator().get(&id).await {
                Ok(job) => println!("{}", render::render_detail(&job)),
                Err(err) => println!("{err}"),
            },
            Input::Quit => {}
        }
    }

    /// Surfaces what the store and credential do not announce themselves:
    /// background refresh failures and a lost session.
    fn tick(&mut self) {
        if self.state.session() == SessionState::Active && !self.credential.is_present() {
            self.dispatch(Msg::SessionExpired);
        }

        let failure = lock_store(&self.store).freshness().last_error.clone();
        if failure != self.reported_failure {
            if let Some(reason) = &failure {
                self.dispatch(Msg::RefreshFailed(reason.clone()));
            }
            self.reported_failure = failure;
        }

        self.dispatch(Msg::Tick);
    }
}
