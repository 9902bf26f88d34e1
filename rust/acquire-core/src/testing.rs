// rust/acquire-core/src/testing.rs

//! In-memory sources and sinks shared by unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use bytes::Bytes;
use serde_json::json;

use crate::dataset::{Record, RecordSource, RecordStream, StreamRequest};
use crate::error::{AcquireError, Result};
use crate::storage::{RemoteStore, ShardLocation, ShardSink};

pub(crate) fn record(id: usize, text: &str) -> Record {
    let mut record = Record::new();
    record.insert("id".to_string(), json!(id));
    record.insert("text".to_string(), json!(text));
    record
}

pub(crate) fn record_id(record: &Record) -> u64 {
    record["id"].as_u64().unwrap()
}

/// Captures every persisted shard, optionally failing on the n-th persist.
#[derive(Default)]
pub(crate) struct RecordingSink {
    shards: RefCell<Vec<(ShardLocation, Vec<Record>)>>,
    calls: Cell<usize>,
    fail_at: Option<usize>,
}

impl RecordingSink {
    pub(crate) fn failing_at(call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Default::default()
        }
    }

    pub(crate) fn shards(&self) -> Vec<(ShardLocation, Vec<Record>)> {
        self.shards.borrow().clone()
    }
}

impl ShardSink for RecordingSink {
    fn persist(&self, records: &[Record], location: &ShardLocation) -> Result<()> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if self.fail_at == Some(call) {
            return Err(AcquireError::upload(&location.cloud_key, "scripted failure"));
        }
        self.shards
            .borrow_mut()
            .push((location.clone(), records.to_vec()));
        Ok(())
    }
}

pub(crate) type ObjectMap = Rc<RefCell<HashMap<String, Vec<u8>>>>;

/// Remote store keeping objects in a shared map.
#[derive(Default)]
pub(crate) struct MemoryRemote {
    objects: ObjectMap,
}

impl MemoryRemote {
    pub(crate) fn objects(&self) -> ObjectMap {
        Rc::clone(&self.objects)
    }
}

impl RemoteStore for MemoryRemote {
    fn put(&self, key: &str, body: Bytes) -> Result<()> {
        self.objects.borrow_mut().insert(key.to_string(), body.to_vec());
        Ok(())
    }

    fn describe(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}

/// Remote store that fails exactly one put, counted from zero.
pub(crate) struct FlakyRemote {
    inner: MemoryRemote,
    puts: Cell<usize>,
    fail_at: usize,
}

impl FlakyRemote {
    pub(crate) fn failing_at(put: usize) -> Self {
        Self {
            inner: MemoryRemote::default(),
            puts: Cell::new(0),
            fail_at: put,
        }
    }

    pub(crate) fn objects(&self) -> ObjectMap {
        self.inner.objects()
    }
}

impl RemoteStore for FlakyRemote {
    fn put(&self, key: &str, body: Bytes) -> Result<()> {
        let put = self.puts.get();
        self.puts.set(put + 1);
        if put == self.fail_at {
            return Err(AcquireError::upload(key, "access denied"));
        }
        self.inner.put(key, body)
    }

    fn describe(&self, key: &str) -> String {
        self.inner.describe(key)
    }
}

/// Source serving a fixed number of synthetic records per (repo, split).
///
/// Records carry `id` (position in the stream) and `text` (`repo:split`).
#[derive(Default)]
pub(crate) struct ScriptedSource {
    streams: HashMap<(String, String), usize>,
    requests: RefCell<Vec<StreamRequest>>,
}

impl ScriptedSource {
    pub(crate) fn with_stream(mut self, repo: &str, split: &str, count: usize) -> Self {
        self.streams.insert((repo.to_string(), split.to_string()), count);
        self
    }

    pub(crate) fn requests(&self) -> Vec<StreamRequest> {
        self.requests.borrow().clone()
    }
}

impl RecordSource for ScriptedSource {
    fn open(&self, request: &StreamRequest) -> Result<RecordStream> {
        self.requests.borrow_mut().push(request.clone());
        let key = (request.repo.clone(), request.split.clone());
        let count = *self.streams.get(&key).ok_or_else(|| {
            AcquireError::source_open(&request.repo, &request.split, "split not found")
        })?;
        let text = format!("{}:{}", request.repo, request.split);
        Ok(Box::new((0..count).map(move |i| Ok(record(i, &text)))))
    }
}
