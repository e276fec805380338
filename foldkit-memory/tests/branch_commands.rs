//! End-to-end command pipeline tests against the in-memory store, using
//! a small branch-office domain: a branch has a name and a country, is
//! created once, and can be renamed or moved afterwards.

use async_trait::async_trait;
use foldkit::aggregate::Projector;
use foldkit::command::{Command, CommandContext, CommandWithHandler};
use foldkit::errors::{CommandError, CommandResult, EventStoreResult};
use foldkit::event::Event;
use foldkit::executor::CommandExecutor;
use foldkit::partition_keys::PartitionKeys;
use foldkit::store::{EventStore, ExpectedVersion};
use foldkit::types::{AggregateGroup, EventVersion};
use foldkit_memory::InMemoryEventStore;

#[derive(Debug, Clone, PartialEq, Eq)]
enum BranchEvent {
    Created { name: String, country: String },
    NameChanged { name: String },
    CountryChanged { country: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BranchState {
    Empty,
    Branch { name: String, country: String },
}

struct BranchProjector;

impl Projector for BranchProjector {
    type State = BranchState;
    type Event = BranchEvent;

    fn initial_state(&self) -> Self::State {
        BranchState::Empty
    }

    fn project(&self, state: Self::State, event: &Event<Self::Event>) -> Self::State {
        match (state, &event.payload) {
            (BranchState::Empty, BranchEvent::Created { name, country }) => BranchState::Branch {
                name: name.clone(),
                country: country.clone(),
            },
            (BranchState::Branch { country, .. }, BranchEvent::NameChanged { name }) => {
                BranchState::Branch {
                    name: name.clone(),
                    country,
                }
            }
            (BranchState::Branch { name, .. }, BranchEvent::CountryChanged { country }) => {
                BranchState::Branch {
                    name,
                    country: country.clone(),
                }
            }
            (other, _) => other,
        }
    }

    fn version(&self) -> &'static str {
        "1.0"
    }
}

fn branch_group() -> AggregateGroup {
    AggregateGroup::try_new("Branch").unwrap()
}

struct CreateBranch {
    name: String,
    country: String,
}

impl Command for CreateBranch {}

struct ChangeBranchName {
    partition_keys: PartitionKeys,
    name: String,
}

impl Command for ChangeBranchName {}

impl CommandWithHandler for ChangeBranchName {
    type Projector = BranchProjector;

    fn projector(&self) -> Self::Projector {
        BranchProjector
    }

    fn partition_keys(&self) -> PartitionKeys {
        self.partition_keys.clone()
    }

    fn handle(
        &self,
        context: &mut CommandContext<'_, Self::Projector>,
    ) -> CommandResult<Option<BranchEvent>> {
        match context.state() {
            BranchState::Branch { .. } => Ok(Some(BranchEvent::NameChanged {
                name: self.name.clone(),
            })),
            BranchState::Empty => Err(CommandError::BusinessRuleViolation(
                "branch does not exist".to_string(),
            )),
        }
    }
}

struct ChangeBranchCountry {
    partition_keys: PartitionKeys,
    country: String,
}

impl Command for ChangeBranchCountry {}

impl CommandWithHandler for ChangeBranchCountry {
    type Projector = BranchProjector;

    fn projector(&self) -> Self::Projector {
        BranchProjector
    }

    fn partition_keys(&self) -> PartitionKeys {
        self.partition_keys.clone()
    }

    fn handle(
        &self,
        context: &mut CommandContext<'_, Self::Projector>,
    ) -> CommandResult<Option<BranchEvent>> {
        match context.state() {
            BranchState::Branch { country, .. } if country == &self.country => Ok(None),
            BranchState::Branch { .. } => Ok(Some(BranchEvent::CountryChanged {
                country: self.country.clone(),
            })),
            BranchState::Empty => Err(CommandError::BusinessRuleViolation(
                "branch does not exist".to_string(),
            )),
        }
    }
}

type BranchExecutor<ES> = CommandExecutor<ES>;

async fn create_branch<ES>(
    executor: &BranchExecutor<ES>,
    name: &str,
    country: &str,
) -> PartitionKeys
where
    ES: EventStore<Event = BranchEvent>,
{
    let command = CreateBranch {
        name: name.to_string(),
        country: country.to_string(),
    };
    let response = executor
        .execute_with(
            &command,
            &BranchProjector,
            |_| PartitionKeys::generate_in(branch_group()),
            |cmd: &CreateBranch, _context| {
                Ok(Some(BranchEvent::Created {
                    name: cmd.name.clone(),
                    country: cmd.country.clone(),
                }))
            },
        )
        .await
        .unwrap();
    response.partition_keys
}

#[tokio::test]
async fn create_then_rename_round_trip() {
    let executor = CommandExecutor::new(InMemoryEventStore::new());

    let keys = create_branch(&executor, "Tokyo", "Japan").await;
    let response = executor
        .execute(&ChangeBranchName {
            partition_keys: keys.clone(),
            name: "Osaka".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.version, EventVersion::try_new(2).unwrap());

    let aggregate = executor
        .event_store()
        .load(&keys, &BranchProjector)
        .await
        .unwrap();
    assert_eq!(
        aggregate.payload,
        BranchState::Branch {
            name: "Osaka".to_string(),
            country: "Japan".to_string(),
        }
    );
    assert_eq!(aggregate.version, EventVersion::try_new(2).unwrap());
    assert_eq!(
        aggregate.last_sortable_unique_id,
        Some(response.events[0].sortable_unique_id.clone())
    );
}

#[tokio::test]
async fn loading_an_unknown_partition_yields_the_empty_aggregate() {
    let store: InMemoryEventStore<BranchEvent> = InMemoryEventStore::new();
    let keys = PartitionKeys::generate_in(branch_group());

    let aggregate = store.load(&keys, &BranchProjector).await.unwrap();

    assert_eq!(aggregate.payload, BranchState::Empty);
    assert_eq!(aggregate.version, EventVersion::initial());
    assert!(aggregate.last_sortable_unique_id.is_none());
}

#[tokio::test]
async fn versions_are_strictly_sequential_under_a_single_writer() {
    let executor = CommandExecutor::new(InMemoryEventStore::new());
    let keys = create_branch(&executor, "Tokyo", "Japan").await;

    for i in 0..5 {
        executor
            .execute(&ChangeBranchName {
                partition_keys: keys.clone(),
                name: format!("Branch {i}"),
            })
            .await
            .unwrap();
    }

    let versions: Vec<u64> = executor
        .event_store()
        .events_for(&keys)
        .await
        .unwrap()
        .iter()
        .map(|event| event.version.into())
        .collect();
    assert_eq!(versions, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn unchanged_country_emits_no_event() {
    let executor = CommandExecutor::new(InMemoryEventStore::new());
    let keys = create_branch(&executor, "Tokyo", "Japan").await;

    let response = executor
        .execute(&ChangeBranchCountry {
            partition_keys: keys.clone(),
            country: "Japan".to_string(),
        })
        .await
        .unwrap();

    assert!(response.events.is_empty());
    assert_eq!(response.version, EventVersion::try_new(1).unwrap());
    assert_eq!(executor.event_store().event_count(), 1);
}

#[tokio::test]
async fn commands_against_missing_branches_are_rejected() {
    let executor: CommandExecutor<InMemoryEventStore<BranchEvent>> =
        CommandExecutor::new(InMemoryEventStore::new());

    let result = executor
        .execute(&ChangeBranchName {
            partition_keys: PartitionKeys::generate_in(branch_group()),
            name: "Nagoya".to_string(),
        })
        .await;

    assert!(matches!(
        result,
        Err(CommandError::BusinessRuleViolation(_))
    ));
    assert_eq!(executor.event_store().event_count(), 0);
}

#[tokio::test]
async fn partitions_are_isolated_from_each_other() {
    let executor = CommandExecutor::new(InMemoryEventStore::new());
    let tokyo = create_branch(&executor, "Tokyo", "Japan").await;
    let paris = create_branch(&executor, "Paris", "France").await;

    executor
        .execute(&ChangeBranchName {
            partition_keys: tokyo.clone(),
            name: "Osaka".to_string(),
        })
        .await
        .unwrap();

    let aggregate = executor
        .event_store()
        .load(&paris, &BranchProjector)
        .await
        .unwrap();
    assert_eq!(
        aggregate.payload,
        BranchState::Branch {
            name: "Paris".to_string(),
            country: "France".to_string(),
        }
    );
    assert_eq!(aggregate.version, EventVersion::try_new(1).unwrap());
}

/// Store wrapper whose reads lag one event behind the log, simulating a
/// competing writer landing between load and append.
struct StaleReadStore {
    inner: InMemoryEventStore<BranchEvent>,
}

#[async_trait]
impl EventStore for StaleReadStore {
    type Event = BranchEvent;

    async fn append_all(
        &self,
        partition_keys: &PartitionKeys,
        expected_version: ExpectedVersion,
        events: Vec<Event<Self::Event>>,
    ) -> EventStoreResult<EventVersion> {
        self.inner
            .append_all(partition_keys, expected_version, events)
            .await
    }

    async fn events_for(
        &self,
        partition_keys: &PartitionKeys,
    ) -> EventStoreResult<Vec<Event<Self::Event>>> {
        let mut events = self.inner.events_for(partition_keys).await?;
        events.pop();
        Ok(events)
    }

    async fn latest_version(
        &self,
        partition_keys: &PartitionKeys,
    ) -> EventStoreResult<Option<EventVersion>> {
        self.inner.latest_version(partition_keys).await
    }
}

#[tokio::test]
async fn racing_writers_surface_a_concurrency_conflict() {
    let store = InMemoryEventStore::new();
    let executor = CommandExecutor::new(InMemoryEventStore::clone(&store));
    let keys = create_branch(&executor, "Tokyo", "Japan").await;
    executor
        .execute(&ChangeBranchName {
            partition_keys: keys.clone(),
            name: "Osaka".to_string(),
        })
        .await
        .unwrap();

    // This executor loads version 1 while the log is already at 2.
    let lagging = CommandExecutor::new(StaleReadStore { inner: store });
    let result = lagging
        .execute(&ChangeBranchName {
            partition_keys: keys.clone(),
            name: "Kyoto".to_string(),
        })
        .await;

    match result {
        Err(CommandError::ConcurrencyConflict { partition_keys }) => {
            assert_eq!(partition_keys, keys);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }

    // The losing write left no trace; the log still holds versions 1 and 2.
    let versions: Vec<u64> = executor
        .event_store()
        .events_for(&keys)
        .await
        .unwrap()
        .iter()
        .map(|event| event.version.into())
        .collect();
    assert_eq!(versions, vec![1, 2]);
}
