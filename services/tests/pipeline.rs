//! End-to-end command pipeline scenarios over the in-memory backend.

use common::LifecycleState;
use db::domain::{Creator, Location, Priority};
use db::models::tickets::TicketStatus;
use db::store::manager::StoreManager;
use db::store::{MemoryStore, StoreKind};
use relay::manager::RelayManager;
use relay::{NodeId, TeleportRequest, TELEPORT_CHANNEL};
use services::capabilities::{Directory, LocaleProvider, MessageSink, MessageTarget, PermissionProvider};
use services::notify::{NotificationEngine, PERM_CREATOR_ALERT, PERM_MASS_NOTIFY};
use services::pipeline::{CommandPipeline, PipelineConfig, PERM_SILENCE};
use services::testing::{FakeDirectory, FakePermissions, PlainLocale, RecordingSink};
use services::CommandSender;
use std::sync::Arc;
use uuid::Uuid;

struct Cluster {
    pipeline: CommandPipeline,
    permissions: Arc<FakePermissions>,
    directory: Arc<FakeDirectory>,
    sink: Arc<RecordingSink>,
    store: Arc<StoreManager>,
    relay: Arc<RelayManager>,
}

fn cluster(config: PipelineConfig) -> Cluster {
    let permissions = Arc::new(FakePermissions::new());
    let directory = Arc::new(FakeDirectory::new());
    let sink = Arc::new(RecordingSink::new());
    let locale: Arc<dyn LocaleProvider> = Arc::new(PlainLocale);
    let relay = Arc::new(RelayManager::new(NodeId::random()));
    let store = Arc::new(StoreManager::new(
        Arc::new(MemoryStore::new()),
        LifecycleState::new(),
    ));
    let notify = Arc::new(NotificationEngine::new(
        Arc::clone(&permissions) as Arc<dyn PermissionProvider>,
        Arc::clone(&directory) as Arc<dyn Directory>,
        Arc::clone(&sink) as Arc<dyn MessageSink>,
        Arc::clone(&locale),
        Arc::clone(&relay),
        false,
    ));
    let pipeline = CommandPipeline::new(
        Arc::clone(&store),
        Arc::clone(&permissions) as Arc<dyn PermissionProvider>,
        Arc::clone(&directory) as Arc<dyn Directory>,
        Arc::clone(&sink) as Arc<dyn MessageSink>,
        locale,
        notify,
        Arc::clone(&relay),
        config,
    );
    Cluster {
        pipeline,
        permissions,
        directory,
        sink,
        store,
        relay,
    }
}

fn args(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

fn player(name: &str) -> CommandSender {
    CommandSender::Player {
        uuid: Uuid::new_v4(),
        name: name.to_string(),
    }
}

fn uuid_of(sender: &CommandSender) -> Uuid {
    match sender {
        CommandSender::Player { uuid, .. } => *uuid,
        CommandSender::Console => panic!("console has no uuid"),
    }
}

fn grant_basics(c: &Cluster, sender: &CommandSender) {
    let uuid = uuid_of(sender);
    for perm in [
        "ticket.command.create",
        "ticket.command.comment.own",
        "ticket.command.close.own",
        "ticket.command.view.own",
    ] {
        c.permissions.grant_player(uuid, perm);
    }
}

#[tokio::test]
async fn create_view_close_round_trip() {
    let c = cluster(PipelineConfig::default());
    let steve = player("Steve");
    grant_basics(&c, &steve);
    c.directory.connect(steve.clone());

    assert!(c.pipeline.execute(&steve, &args("create my chest was looted")).await);

    let store = c.store.active().await;
    let ticket = store.get(1).await.unwrap().unwrap();
    assert_eq!(ticket.creator, steve.as_creator());
    assert_eq!(ticket.first_message(), "my chest was looted");
    assert_eq!(ticket.status, TicketStatus::Open);

    c.sink.clear();
    assert!(c.pipeline.execute(&steve, &args("view 1")).await);
    let lines = c.sink.sent_to(&MessageTarget::Player(uuid_of(&steve)));
    assert!(lines[0].contains("ticket.view.header"));
    assert!(lines[0].contains("id=1"));

    assert!(c.pipeline.execute(&steve, &args("close 1 found it, nevermind")).await);
    let ticket = store.get(1).await.unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::Closed);
    assert_eq!(ticket.last_closer(), Some(&steve.as_creator()));
}

#[tokio::test]
async fn unknown_id_and_bad_verb_warn_without_panicking() {
    let c = cluster(PipelineConfig::default());
    let console = CommandSender::Console;

    assert!(!c.pipeline.execute(&console, &args("view 99")).await);
    let lines = c.sink.sent_to(&MessageTarget::Console);
    assert!(lines.last().unwrap().contains("ticket.warn.invalid-id"));

    assert!(!c.pipeline.execute(&console, &args("frobnicate 1")).await);
    assert!(!c.pipeline.execute(&console, &[]).await);
}

#[tokio::test]
async fn duality_permission_limits_closing_to_own_tickets() {
    let c = cluster(PipelineConfig::default());
    let steve = player("Steve");
    let alex = player("Alex");
    grant_basics(&c, &steve);
    grant_basics(&c, &alex);

    assert!(c.pipeline.execute(&steve, &args("create lost my dog")).await);

    // `.own` does not cover someone else's ticket.
    assert!(!c.pipeline.execute(&alex, &args("close 1")).await);
    let lines = c.sink.sent_to(&MessageTarget::Player(uuid_of(&alex)));
    assert!(lines.last().unwrap().contains("ticket.warn.no-permission"));

    // `.all` does.
    c.permissions.grant_player(uuid_of(&alex), "ticket.command.close.all");
    assert!(c.pipeline.execute(&alex, &args("close 1")).await);
}

#[tokio::test]
async fn status_preconditions_are_enforced() {
    let c = cluster(PipelineConfig::default());
    let console = CommandSender::Console;

    assert!(c.pipeline.execute(&console, &args("create stuck in wall")).await);
    assert!(c.pipeline.execute(&console, &args("close 1")).await);

    assert!(!c.pipeline.execute(&console, &args("comment 1 still stuck")).await);
    let lines = c.sink.sent_to(&MessageTarget::Console);
    assert!(lines.last().unwrap().contains("ticket.warn.must-be-open"));

    assert!(c.pipeline.execute(&console, &args("reopen 1")).await);
    assert!(!c.pipeline.execute(&console, &args("reopen 1")).await);
    let lines = c.sink.sent_to(&MessageTarget::Console);
    assert!(lines.last().unwrap().contains("ticket.warn.must-be-closed"));
}

#[tokio::test]
async fn silent_close_requires_silence_permission() {
    let c = cluster(PipelineConfig::default());
    let steve = player("Steve");
    grant_basics(&c, &steve);

    assert!(c.pipeline.execute(&steve, &args("create noisy ticket")).await);
    assert!(!c.pipeline.execute(&steve, &args("s.close 1")).await);

    c.permissions.grant_player(uuid_of(&steve), PERM_SILENCE);
    assert!(c.pipeline.execute(&steve, &args("s.close 1")).await);
}

#[tokio::test]
async fn silent_close_suppresses_broadcast_and_creator_alert() {
    let c = cluster(PipelineConfig::default());
    let console = CommandSender::Console;
    let steve = player("Steve");
    let watcher = player("Watcher");
    grant_basics(&c, &steve);
    c.permissions.grant_player(uuid_of(&steve), PERM_CREATOR_ALERT);
    c.permissions.grant_player(uuid_of(&watcher), PERM_MASS_NOTIFY);
    c.directory.connect(steve.clone());
    c.directory.connect(watcher.clone());

    assert!(c.pipeline.execute(&steve, &args("create griefing at spawn")).await);
    c.sink.clear();

    assert!(c.pipeline.execute(&console, &args("s.close 1")).await);
    // The console implicitly holds mass-notify, so a silent close by it is
    // fully quiet.
    assert!(c.sink.sent().is_empty());

    assert!(c.pipeline.execute(&console, &args("reopen 1")).await);
    c.sink.clear();
    assert!(c.pipeline.execute(&console, &args("close 1")).await);
    let sent = c.sink.sent();
    assert!(sent
        .iter()
        .any(|(t, _)| *t == MessageTarget::Player(uuid_of(&steve))));
    assert!(sent
        .iter()
        .any(|(t, _)| *t == MessageTarget::Player(uuid_of(&watcher))));
}

#[tokio::test]
async fn cooldown_blocks_second_create_until_expiry() {
    let mut config = PipelineConfig::default();
    config.cooldown_enabled = true;
    config.cooldown = std::time::Duration::from_secs(300);
    let c = cluster(config);
    let steve = player("Steve");
    grant_basics(&c, &steve);

    assert!(c.pipeline.execute(&steve, &args("create first problem")).await);
    assert!(!c.pipeline.execute(&steve, &args("create second problem")).await);
    let lines = c.sink.sent_to(&MessageTarget::Player(uuid_of(&steve)));
    assert!(lines.last().unwrap().contains("ticket.warn.under-cooldown"));

    // The console is exempt.
    let console = CommandSender::Console;
    assert!(c.pipeline.execute(&console, &args("create console ticket")).await);
    assert!(c.pipeline.execute(&console, &args("create another console ticket")).await);
}

#[tokio::test]
async fn commenting_starts_a_cooldown_window_of_its_own() {
    let mut config = PipelineConfig::default();
    config.cooldown_enabled = true;
    config.cooldown = std::time::Duration::from_secs(300);
    let c = cluster(config);
    let console = CommandSender::Console;
    let alex = player("Alex");
    c.permissions.grant_player(uuid_of(&alex), "ticket.command.comment.all");

    assert!(c.pipeline.execute(&console, &args("create water leak at spawn")).await);

    // Alex has not created anything, so the first comment goes through.
    assert!(c.pipeline.execute(&alex, &args("comment 1 looking into it")).await);
    assert!(!c.pipeline.execute(&alex, &args("comment 1 any minute now")).await);
    let lines = c.sink.sent_to(&MessageTarget::Player(uuid_of(&alex)));
    assert!(lines.last().unwrap().contains("ticket.warn.under-cooldown"));
}

#[tokio::test]
async fn locked_lifecycle_rejects_commands() {
    let c = cluster(PipelineConfig::default());
    let console = CommandSender::Console;

    assert!(c.store.lifecycle().lock());
    assert!(!c.pipeline.execute(&console, &args("create anything")).await);
    let lines = c.sink.sent_to(&MessageTarget::Console);
    assert!(lines.last().unwrap().contains("ticket.warn.locked"));

    c.store.lifecycle().unlock();
    assert!(c.pipeline.execute(&console, &args("create anything")).await);
}

#[tokio::test]
async fn unread_marker_set_by_others_and_cleared_on_view() {
    let c = cluster(PipelineConfig::default());
    let console = CommandSender::Console;
    let steve = player("Steve");
    grant_basics(&c, &steve);

    assert!(c.pipeline.execute(&steve, &args("create lava near road")).await);
    let store = c.store.active().await;
    assert!(!store.get(1).await.unwrap().unwrap().creator_status_update);

    assert!(c.pipeline.execute(&console, &args("comment 1 on my way")).await);
    assert!(store.get(1).await.unwrap().unwrap().creator_status_update);

    assert!(c.pipeline.execute(&steve, &args("view 1")).await);
    assert!(!store.get(1).await.unwrap().unwrap().creator_status_update);
}

#[tokio::test]
async fn teleport_on_the_filing_server_moves_the_player_locally() {
    let c = cluster(PipelineConfig::default());
    let steve = player("Steve");
    grant_basics(&c, &steve);
    c.permissions.grant_player(uuid_of(&steve), "ticket.command.teleport.own");

    let filed_at = Location::FromPlayer {
        server: "server".to_string(),
        world: "mines".to_string(),
        x: 10,
        y: 64,
        z: -3,
    };
    c.directory.set_location(uuid_of(&steve), filed_at.clone());
    assert!(c.pipeline.execute(&steve, &args("create fell into my own trap")).await);

    assert!(c.pipeline.execute(&steve, &args("teleport 1")).await);
    assert_eq!(c.directory.teleports(), vec![(uuid_of(&steve), filed_at)]);
    let lines = c.sink.sent_to(&MessageTarget::Player(uuid_of(&steve)));
    assert!(lines.last().unwrap().contains("ticket.teleport.local"));
}

#[tokio::test]
async fn teleport_to_another_server_publishes_a_relay_request() {
    let c = cluster(PipelineConfig::default());
    let steve = player("Steve");
    grant_basics(&c, &steve);
    c.permissions.grant_player(uuid_of(&steve), "ticket.command.teleport.own");

    c.directory.set_location(
        uuid_of(&steve),
        Location::FromPlayer {
            server: "hub".to_string(),
            world: "plaza".to_string(),
            x: 0,
            y: 70,
            z: 12,
        },
    );
    assert!(c.pipeline.execute(&steve, &args("create stuck under the fountain")).await);

    let mut frames = c.relay.subscribe(TELEPORT_CHANNEL).await;
    assert!(c.pipeline.execute(&steve, &args("teleport 1")).await);

    // Nothing moved on this node; the filing server owns the move.
    assert!(c.directory.teleports().is_empty());
    let request = TeleportRequest::decode(&frames.try_recv().unwrap()).unwrap();
    assert_eq!(request.target, uuid_of(&steve));
    assert_eq!(request.server, "hub");
    assert_eq!(request.world, "plaza");
    assert_eq!((request.x, request.y, request.z), (0, 70, 12));
    let lines = c.sink.sent_to(&MessageTarget::Player(uuid_of(&steve)));
    assert!(lines.last().unwrap().contains("ticket.teleport.cross-server"));
}

#[tokio::test]
async fn search_compiles_and_pages() {
    let mut config = PipelineConfig::default();
    config.page_size = 2;
    let c = cluster(config);
    let console = CommandSender::Console;

    for i in 0..5 {
        assert!(c.pipeline.execute(&console, &args(&format!("create issue number {i}"))).await);
    }
    assert!(c.pipeline.execute(&console, &args("setpriority 3 highest")).await);
    c.sink.clear();

    assert!(c.pipeline.execute(&console, &args("search priority > normal")).await);
    let lines = c.sink.sent_to(&MessageTarget::Console);
    assert!(lines[0].contains("ticket.search.header"));
    assert!(lines[0].contains("total=1"));
    assert!(lines[1].contains("id=3"));

    c.sink.clear();
    assert!(!c.pipeline.execute(&console, &args("search priority ~ high")).await);
    let lines = c.sink.sent_to(&MessageTarget::Console);
    assert!(lines.last().unwrap().contains("ticket.warn.bad-search-query"));
}

#[tokio::test]
async fn mass_close_closes_range_and_reports_bounds() {
    let c = cluster(PipelineConfig::default());
    let console = CommandSender::Console;

    for i in 0..4 {
        assert!(c.pipeline.execute(&console, &args(&format!("create spam {i}"))).await);
    }
    assert!(c.pipeline.execute(&console, &args("close 2")).await);
    c.sink.clear();

    assert!(c.pipeline.execute(&console, &args("massclose 1 3")).await);
    let store = c.store.active().await;
    for id in [1, 2, 3] {
        assert_eq!(
            store.get(id).await.unwrap().unwrap().status,
            TicketStatus::Closed
        );
    }
    assert_eq!(
        store.get(4).await.unwrap().unwrap().status,
        TicketStatus::Open
    );
    let lines = c.sink.sent_to(&MessageTarget::Console);
    assert!(lines.last().unwrap().contains("lower=1"));
    assert!(lines.last().unwrap().contains("upper=3"));
}

#[tokio::test]
async fn migration_to_sqlite_preserves_tickets_and_rejects_same_backend() {
    let c = cluster(PipelineConfig::default());
    let console = CommandSender::Console;

    for i in 0..3 {
        assert!(c.pipeline.execute(&console, &args(&format!("create ticket {i}"))).await);
    }
    assert!(c.pipeline.execute(&console, &args("setpriority 2 high")).await);

    assert!(c.pipeline.execute(&console, &args("migrate sqlite sqlite::memory:")).await);
    assert_eq!(c.store.active_kind().await, StoreKind::Sqlite);
    assert!(!c.store.lifecycle().is_locked());

    let store = c.store.active().await;
    assert_eq!(store.count().await.unwrap(), 3);
    let second = store.get(2).await.unwrap().unwrap();
    assert_eq!(second.priority, Priority::High);
    assert_eq!(second.creator, Creator::Console);

    // Migrating to the backend already in use is refused.
    assert!(!c.pipeline.execute(&console, &args("migrate sqlite")).await);
    let lines = c.sink.sent_to(&MessageTarget::Console);
    assert!(lines.last().unwrap().contains("ticket.migrate.same-backend"));
}

#[tokio::test]
async fn reload_drains_and_unlocks() {
    let c = cluster(PipelineConfig::default());
    let console = CommandSender::Console;

    assert!(c.pipeline.execute(&console, &args("reload")).await);
    assert!(!c.store.lifecycle().is_locked());
    let lines = c.sink.sent_to(&MessageTarget::Console);
    assert!(lines.iter().any(|l| l.contains("ticket.reload.started")));
    assert!(lines.iter().any(|l| l.contains("ticket.reload.completed")));

    // State stayed usable afterwards.
    assert!(c.pipeline.execute(&console, &args("create after reload")).await);
}
