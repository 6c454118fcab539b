// FICHIER : caddie/tools/caddie-cli/src/main.rs

use clap::{Parser, Subcommand};

// On garde le module local des commandes
mod commands;

use caddie::cart_engine::{CartEvent, CartSession, NoticeKind, SessionSettings, SyncOutcome};
use caddie::cart_engine::model::ProductRef;
use caddie::remote::{InMemoryCartService, RemoteError, ScriptedOptimizer, SessionIdentity};
use caddie::utils::error::AnyResult;
use caddie::utils::{context, data, prelude::*, Arc};
use caddie::{user_error, user_info, user_success};

// EMBARQUEMENT DES RESSOURCES (Compilation)
const DEFAULT_LOCALE_FR: &str = include_str!("../../../../locales/fr.json");
const DEFAULT_LOCALE_EN: &str = include_str!("../../../../locales/en.json");

#[derive(Parser)]
#[command(name = "caddie-cli")]
#[command(about = "Pilotage du panier : articles, substitutions, optimisation multi-magasins", long_about = None)]
#[command(version)]
struct Cli {
    /// Travaille sur un service panier en mémoire (aucun appel réseau)
    #[arg(long)]
    offline: bool,

    /// Identifiant de session anonyme
    #[arg(long, env = "CADDIE_ANON_ID", default_value = "caddie-cli")]
    anonymous_id: String,

    /// Jeton d'authentification (prioritaire sur l'identité anonyme)
    #[arg(long, env = "CADDIE_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    // Optionnel pour permettre le mode Shell Interactif
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Debug)]
enum Commands {
    /// Articles et cycle de vie des paniers
    Cart(commands::cart::CartArgs),

    /// Substitutions proposées pour une ligne
    Sub(commands::sub::SubArgs),

    /// Optimisation multi-magasins du panier actif
    Optimize(commands::optimize::OptimizeArgs),

    /// État de la synchronisation
    Status,
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    // 1. Initialisation de la Configuration (CRITIQUE)
    if let Err(e) = AppConfig::init() {
        eprintln!("❌ CRITICAL ERROR: Impossible d'initialiser la configuration.");
        eprintln!("   Détails : {}", e);
        std::process::exit(1);
    }

    // 2. Initialisation du Logger
    context::init_logging();

    // 3. BOOTSTRAP DES LOCALES
    bootstrap_locales().await;
    context::init_i18n(&AppConfig::get().core.language);

    // 4. Parsing & construction de la session
    let cli = Cli::parse();
    let session = build_session(&cli)?;
    watch_notices(&session);

    if let Err(e) = session.bootstrap().await {
        user_error!("CART_LOAD_FAILED", "{}", e);
    }

    match cli.command {
        Some(cmd) => {
            // Mode "One-Shot" : les modifications partent avant la sortie
            let result = execute_command(cmd, &session).await;
            report_flush(session.flush().await);
            if let Err(e) = result {
                user_error!("CMD_FAIL", "{}", e);
                std::process::exit(1);
            }
        }
        None => {
            // Mode "Global Shell"
            user_info!("CLI_START", "v{}", env!("CARGO_PKG_VERSION"));
            run_global_shell(&session).await?;
        }
    }

    tracing::debug!("Fin de l'exécution du CLI");
    Ok(())
}

fn identity(cli: &Cli) -> SessionIdentity {
    match &cli.token {
        Some(token) => SessionIdentity::Token(token.clone()),
        None => SessionIdentity::Anonymous(cli.anonymous_id.clone()),
    }
}

fn build_session(cli: &Cli) -> AnyResult<CartSession> {
    if cli.offline {
        info!("🔌 Mode hors-ligne : service panier en mémoire");
        return Ok(offline_session(SessionSettings::from_config(AppConfig::get())));
    }
    Ok(CartSession::from_config(identity(cli))?)
}

/// Catalogue de démonstration pour le mode hors-ligne.
fn demo_catalog() -> Vec<ProductRef> {
    vec![
        ProductRef::new("p-milk", "Lait demi-écrémé 1L")
            .with_price("s-maxi", 1.19)
            .with_price("s-metro", 1.29),
        ProductRef::new("p-oat", "Boisson avoine 1L").with_price("s-metro", 2.49),
        ProductRef::new("p-bread", "Pain tranché").with_price("s-maxi", 2.99),
        ProductRef::new("p-eggs", "Œufs x12")
            .with_price("s-maxi", 4.49)
            .with_price("s-iga", 4.19),
    ]
}

fn offline_session(settings: SessionSettings) -> CartSession {
    let service = InMemoryCartService::with_products(demo_catalog());
    let optimizer = ScriptedOptimizer::failing(RemoteError::Transport(
        "optimiseur indisponible hors-ligne".into(),
    ));
    CartSession::new(Arc::new(service), Arc::new(optimizer), settings)
}

/// Affiche les notifications du moteur (échecs de synchro, demandes de connexion...).
fn watch_notices(session: &CartSession) {
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                CartEvent::Notice(notice) => match notice.kind {
                    NoticeKind::Info => println!("🔔 {}", notice.message),
                    NoticeKind::LoginRequired => eprintln!("🔐 {}", notice.message),
                    NoticeKind::Warning | NoticeKind::Error => eprintln!("⚠️ {}", notice.message),
                },
                CartEvent::Synced(SyncOutcome::Confirmed { revision }) => {
                    tracing::debug!(revision, "Synchronisation confirmée");
                }
                _ => {}
            }
        }
    });
}

fn report_flush(outcome: Option<SyncOutcome>) {
    match outcome {
        Some(SyncOutcome::Confirmed { .. }) => user_success!("CART_SYNCED"),
        Some(other) => tracing::debug!(?other, "Synchronisation finale"),
        None => {}
    }
}

/// Boucle principale du Shell Global (REPL)
async fn run_global_shell(session: &CartSession) -> AnyResult<()> {
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    let mut rl = DefaultEditor::new()?;
    let history_path = AppConfig::get()
        .get_path("PATH_CADDIE_HOME")
        .map(|home| home.join("history.txt"));

    if let Some(path) = &history_path {
        // Pas d'historique au premier lancement
        let _ = rl.load_history(path);
    }

    loop {
        let readline = rl.readline("CADDIE> ");

        match readline {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                    break;
                }
                if input.eq_ignore_ascii_case("flush") {
                    report_flush(session.flush().await);
                    continue;
                }

                match shell_words::split(input) {
                    Ok(args) => {
                        let mut full_args = vec!["repl".to_string()];
                        full_args.extend(args);

                        match Cli::try_parse_from(full_args) {
                            Ok(cli) => {
                                if let Some(cmd) = cli.command {
                                    if let Err(e) = execute_command(cmd, session).await {
                                        user_error!("CMD_FAIL", "{}", e);
                                    }
                                }
                            }
                            Err(e) => {
                                e.print().ok();
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("❌ Erreur de syntaxe : {}", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                user_error!("CMD_FAIL", "{}", err);
                break;
            }
        }
    }

    // Les modifications en attente partent avant la fermeture
    report_flush(session.flush().await);
    user_info!("CLI_BYE");

    if let Some(path) = &history_path {
        if let Err(e) = rl.save_history(path) {
            tracing::warn!("Impossible de sauvegarder l'historique : {}", e);
        }
    }

    Ok(())
}

async fn execute_command(cmd: Commands, session: &CartSession) -> AnyResult<()> {
    match cmd {
        Commands::Cart(args) => commands::cart::handle(args, session).await,
        Commands::Sub(args) => commands::sub::handle(args, session).await,
        Commands::Optimize(args) => commands::optimize::handle(args, session).await,
        Commands::Status => {
            user_info!(
                "SYNC_STATUS",
                "{:?} (révision {})",
                session.sync_status(),
                session.revision()
            );
            Ok(())
        }
    }
}

/// Déploie les fichiers de langue embarqués s'ils manquent sur le disque
async fn bootstrap_locales() {
    let Some(home) = AppConfig::get().get_path("PATH_CADDIE_HOME") else {
        return;
    };
    let locales_dir = home.join("locales");

    if let Err(e) = tokio::fs::create_dir_all(&locales_dir).await {
        tracing::warn!("Impossible de créer le dossier locales : {}", e);
        return;
    }

    for (name, content) in [("fr.json", DEFAULT_LOCALE_FR), ("en.json", DEFAULT_LOCALE_EN)] {
        let path = locales_dir.join(name);
        if path.exists() {
            continue;
        }

        // Validation : On parse le JSON brut avant écriture
        match data::parse::<data::Value>(content) {
            Ok(_) => match tokio::fs::write(&path, content).await {
                Ok(()) => tracing::debug!("Locale {} déployée.", name),
                Err(e) => tracing::error!("Erreur écriture {}: {}", name, e),
            },
            Err(e) => {
                tracing::error!("❌ locale {} corrompue au build ! : {}", name, e);
            }
        }
    }
}
