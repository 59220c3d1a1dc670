//! `Journal`: punto único por el que pasa cada decisión de la corrida. Escribe
//! en el log y en el `RunEventStore`.

use log::log;
use uuid::Uuid;

use super::{RunEvent, RunEventKind, RunEventStore};

#[derive(Debug)]
pub struct Journal<E: RunEventStore> {
    run_id: Uuid,
    store: E,
    tool_invocations: usize,
}

impl<E: RunEventStore> Journal<E> {
    pub fn new(store: E) -> Self {
        Self { run_id: Uuid::new_v4(),
               store,
               tool_invocations: 0 }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn record(&mut self, kind: RunEventKind) -> RunEvent {
        log!(kind.level(), "{kind}");
        if matches!(kind, RunEventKind::ToolInvoked { .. }) {
            self.tool_invocations += 1;
        }
        self.store.append_kind(self.run_id, kind)
    }

    pub fn tool_invocations(&self) -> usize {
        self.tool_invocations
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.store.list(self.run_id)
    }

    pub fn into_store(self) -> E {
        self.store
    }
}
