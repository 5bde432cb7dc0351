use crate::{
    application::ports::RemoteDirectory,
    domain::{
        comparators::{FieldDiff, Reconcilable},
        entities::*,
        errors::DomainResult,
    },
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Compares the entity collections of a source and a destination realm
pub struct DiffService {
    source: Arc<dyn RemoteDirectory>,
    destination: Arc<dyn RemoteDirectory>,
}

impl DiffService {
    pub fn new(source: Arc<dyn RemoteDirectory>, destination: Arc<dyn RemoteDirectory>) -> Self {
        Self { source, destination }
    }

    #[instrument(
        skip(self),
        fields(source = %self.source.realm(), destination = %self.destination.realm())
    )]
    pub async fn diff(&self, kind: EntityKind) -> DomainResult<DiffReport> {
        Ok(match kind {
            EntityKind::Role => DiffReport::Role(self.diff_roles().await?),
            EntityKind::Client => DiffReport::Client(self.diff_clients().await?),
            EntityKind::Group => DiffReport::Group(self.diff_groups().await?),
            EntityKind::User => DiffReport::User(self.diff_users().await?),
        })
    }

    pub async fn diff_roles(&self) -> DomainResult<Vec<DiffRecord<Role>>> {
        let source = self.source.list_realm_roles().await?;
        let destination = self.destination.list_realm_roles().await?;

        let records = reconcile_collections(&source, &destination);
        log_summary(EntityKind::Role, &records);
        Ok(records)
    }

    pub async fn diff_groups(&self) -> DomainResult<Vec<DiffRecord<GroupDetail>>> {
        let source = flatten_groups(&self.source.list_groups().await?);
        let destination = flatten_groups(&self.destination.list_groups().await?);

        let records = reconcile_collections(&source, &destination);
        log_summary(EntityKind::Group, &records);
        Ok(records)
    }

    pub async fn diff_users(&self) -> DomainResult<Vec<DiffRecord<UserDetail>>> {
        let source = self.source.list_users().await?;
        let destination = self.destination.list_users().await?;

        let records = reconcile_collections(&source, &destination);
        log_summary(EntityKind::User, &records);
        Ok(records)
    }

    /// Client diff, including protocol-mapper drift in client scopes both realms attach.
    pub async fn diff_clients(&self) -> DomainResult<Vec<DiffRecord<ClientDetail>>> {
        let source = self.source.list_clients().await?;
        let destination = self.destination.list_clients().await?;

        let mut records = presence_records(&source, &destination);
        let mut source_scopes = ScopeMapperCache::default();
        let mut destination_scopes = ScopeMapperCache::default();

        for (src, dst) in shared_pairs(&source, &destination) {
            let mut diff = src.compare_config(dst);

            let shared: Vec<String> = src
                .all_scopes()
                .intersection(&dst.all_scopes())
                .cloned()
                .collect();
            for scope_name in shared {
                let Some(src_mappers) =
                    source_scopes.mappers(self.source.as_ref(), &scope_name).await?
                else {
                    continue;
                };
                let Some(dst_mappers) = destination_scopes
                    .mappers(self.destination.as_ref(), &scope_name)
                    .await?
                else {
                    continue;
                };
                compare_scope_mappers(&mut diff, &scope_name, &src_mappers, &dst_mappers);
            }

            push_different(&mut records, src, diff);
        }

        log_summary(EntityKind::Client, &records);
        Ok(records)
    }
}

/// Diff two collections already fetched from their realms.
///
/// Records come out as every `missing_in_destination` (source order), then every
/// `missing_in_source` (destination order), then every `different_config` (source order).
/// When a collection repeats an identity key, the first occurrence is used.
pub fn reconcile_collections<T>(source: &[T], destination: &[T]) -> Vec<DiffRecord<T>>
where
    T: Reconcilable + Clone,
{
    let mut records = presence_records(source, destination);
    for (src, dst) in shared_pairs(source, destination) {
        push_different(&mut records, src, src.compare_config(dst));
    }
    records
}

fn index_by_key<T: Reconcilable>(items: &[T]) -> HashMap<&str, &T> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        index.entry(item.identity_key()).or_insert(item);
    }
    index
}

/// Items in collection order, dropping later occurrences of a repeated key.
fn first_occurrences<T: Reconcilable>(items: &[T]) -> impl Iterator<Item = &T> {
    let mut seen = HashSet::new();
    items.iter().filter(move |item| seen.insert(item.identity_key()))
}

fn presence_records<T>(source: &[T], destination: &[T]) -> Vec<DiffRecord<T>>
where
    T: Reconcilable + Clone,
{
    let source_index = index_by_key(source);
    let destination_index = index_by_key(destination);

    let missing_in_destination = first_occurrences(source)
        .filter(|item| !destination_index.contains_key(item.identity_key()))
        .map(|item| DiffRecord::missing_in_destination(item.clone()));

    let missing_in_source = first_occurrences(destination)
        .filter(|item| !source_index.contains_key(item.identity_key()))
        .map(|item| DiffRecord::missing_in_source(item.clone()));

    missing_in_destination.chain(missing_in_source).collect()
}

fn shared_pairs<'a, T: Reconcilable>(source: &'a [T], destination: &'a [T]) -> Vec<(&'a T, &'a T)> {
    let destination_index = index_by_key(destination);
    first_occurrences(source)
        .filter_map(|src| destination_index.get(src.identity_key()).map(|dst| (src, *dst)))
        .collect()
}

fn push_different<T: Clone>(records: &mut Vec<DiffRecord<T>>, entity: &T, diff: FieldDiff) {
    let (differences, source_value, destination_value) = diff.into_parts();
    if let Some(record) =
        DiffRecord::different_config(entity.clone(), differences, source_value, destination_value)
    {
        records.push(record);
    }
}

/// Every group at every depth, each still carrying its own sub-groups.
fn flatten_groups(groups: &[GroupDetail]) -> Vec<GroupDetail> {
    groups
        .iter()
        .flat_map(GroupDetail::flatten)
        .cloned()
        .collect()
}

/// Record `scopeMappers_<scope>` when the two copies of a scope carry different mappers.
fn compare_scope_mappers(
    diff: &mut FieldDiff,
    scope_name: &str,
    source: &[ProtocolMapper],
    destination: &[ProtocolMapper],
) {
    let source_by_name: BTreeMap<&str, &ProtocolMapper> =
        source.iter().map(|m| (m.name.as_str(), m)).collect();
    let destination_by_name: BTreeMap<&str, &ProtocolMapper> =
        destination.iter().map(|m| (m.name.as_str(), m)).collect();

    let names_differ = source_by_name.keys().ne(destination_by_name.keys());
    let definitions_differ = source_by_name.iter().any(|(name, mapper)| {
        destination_by_name
            .get(name)
            .is_some_and(|other| !mapper.same_definition(other))
    });

    if names_differ || definitions_differ {
        let source_names: Vec<&str> = source_by_name.keys().copied().collect();
        let destination_names: Vec<&str> = destination_by_name.keys().copied().collect();
        diff.record(format!("scopeMappers_{scope_name}"), source_names, destination_names);
    }
}

/// Mapper lists per scope name for one realm, fetched at most once per diff run.
#[derive(Default)]
struct ScopeMapperCache {
    scopes: HashMap<String, Option<Vec<ProtocolMapper>>>,
}

impl ScopeMapperCache {
    /// `None` when the scope cannot be read; only session-level failures propagate.
    async fn mappers(
        &mut self,
        directory: &dyn RemoteDirectory,
        scope_name: &str,
    ) -> DomainResult<Option<Vec<ProtocolMapper>>> {
        if let Some(cached) = self.scopes.get(scope_name) {
            return Ok(cached.clone());
        }

        let fetched = match fetch_scope_mappers(directory, scope_name).await {
            Ok(mappers) => Some(mappers),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!(
                    realm = %directory.realm(),
                    scope = %scope_name,
                    error = %e,
                    "Skipping scope mapper comparison"
                );
                None
            }
        };

        self.scopes.insert(scope_name.to_string(), fetched.clone());
        Ok(fetched)
    }
}

/// Mappers of a scope: from the scope detail when present, otherwise fetched separately.
pub(crate) async fn fetch_scope_mappers(
    directory: &dyn RemoteDirectory,
    scope_name: &str,
) -> DomainResult<Vec<ProtocolMapper>> {
    let scope = directory.get_client_scope(scope_name).await?;
    scope_mappers(directory, &scope).await
}

pub(crate) async fn scope_mappers(
    directory: &dyn RemoteDirectory,
    scope: &ClientScope,
) -> DomainResult<Vec<ProtocolMapper>> {
    if !scope.protocol_mappers.is_empty() {
        return Ok(scope.protocol_mappers.clone());
    }
    match &scope.id {
        Some(id) => directory.list_scope_mappers(id).await,
        None => Ok(Vec::new()),
    }
}

fn log_summary<T>(kind: EntityKind, records: &[DiffRecord<T>]) {
    let count = |status: DiffStatus| records.iter().filter(|r| r.status == status).count();
    info!(
        kind = %kind,
        missing_in_destination = count(DiffStatus::MissingInDestination),
        missing_in_source = count(DiffStatus::MissingInSource),
        different_config = count(DiffStatus::DifferentConfig),
        "Diff completed"
    );
}
