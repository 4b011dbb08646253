//! Per-parse session: arenas, codecs and the sticky error latch.

use std::{fmt, fs::File, path::Path, rc::Rc};

use tracing::{debug, trace, warn};

use crate::{
    arena::{Arena, ArenaStats, DEFAULT_BLOCK_CAPACITY, HandleId, Slot, StreamId},
    codec::{Inflate, NoInflate, PassThrough, TextDecode},
    errors::{Error, Result},
    handle::{Handle, HasHandle},
    source::Source,
    stream::Stream,
    types::TypeTag,
    value::{Array, ArrayData, Bytes, KsString, Payload},
};

/// Session configuration. Setters chain:
///
/// ```
/// use kstream::{Config, Session};
///
/// let mut config = Config::default();
/// config.set_block_capacity(64);
/// let session = Session::new(config);
/// assert!(session.error().is_none());
/// ```
pub struct Config {
    pub block_capacity: usize,
    pub inflate: Box<dyn Inflate>,
    pub decoder: Box<dyn TextDecode>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_capacity: DEFAULT_BLOCK_CAPACITY,
            inflate: Box::new(NoInflate),
            decoder: Box::new(PassThrough),
        }
    }
}

impl Config {
    /// Slots per arena block.
    pub fn set_block_capacity(&mut self, block_capacity: usize) -> &mut Self {
        self.block_capacity = block_capacity;
        self
    }

    pub fn set_inflate(&mut self, inflate: impl Inflate + 'static) -> &mut Self {
        self.inflate = Box::new(inflate);
        self
    }

    pub fn set_decoder(&mut self, decoder: impl TextDecode + 'static) -> &mut Self {
        self.decoder = Box::new(decoder);
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("block_capacity", &self.block_capacity)
            .finish_non_exhaustive()
    }
}

/// Owns everything produced while parsing one input.
///
/// Every operation returns a [Result]. The first failure is latched: until
/// [Session::clear_error] is called, later operations return a copy of it
/// without touching any stream. Fatal errors stay latched for good.
pub struct Session {
    pub(crate) config: Config,
    pub(crate) streams: Arena<Stream>,
    pub(crate) handles: Arena<Handle>,
    pub(crate) buffers: Arena<Vec<u8>>,
    pub(crate) strings: Arena<String>,
    pub(crate) arrays: Arena<ArrayData>,
    detached: StreamId,
    error: Option<Error>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let capacity = config.block_capacity;
        let mut streams = Arena::with_block_capacity(capacity);
        let detached = streams.alloc(Stream::from_memory(Vec::new()));

        debug!(block_capacity = capacity, "session created");

        Self {
            config,
            streams,
            handles: Arena::with_block_capacity(capacity),
            buffers: Arena::with_block_capacity(capacity),
            strings: Arena::with_block_capacity(capacity),
            arrays: Arena::with_block_capacity(capacity),
            detached,
            error: None,
        }
    }

    /// Empty stream owning values that do not come from real input.
    pub fn detached_stream(&self) -> StreamId {
        self.detached
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Takes the latched error. Fatal errors are reported but stay latched.
    pub fn clear_error(&mut self) -> Option<Error> {
        match &self.error {
            Some(e) if e.is_fatal() => Some(e.clone()),
            _ => self.error.take(),
        }
    }

    /// Runs `op`, yielding `T::default()` if it fails or an error is latched.
    pub fn or_default<T: Default>(&mut self, op: impl FnOnce(&mut Session) -> Result<T>) -> T {
        op(self).unwrap_or_default()
    }

    pub(crate) fn ensure_clear(&self) -> Result<()> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Latches the first failure of `result`.
    pub(crate) fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if self.error.is_none() {
                warn!(error = %e, "session error latched");
                self.error = Some(e.clone());
            }
        }
        result
    }

    /// Runs `op` against stream `id` under the latch.
    pub fn read<T>(
        &mut self,
        id: StreamId,
        op: impl FnOnce(&mut Stream) -> Result<T>,
    ) -> Result<T> {
        self.ensure_clear()?;
        let result = self.streams.get_mut(id).and_then(op);
        self.guard(result)
    }

    pub fn stream(&self, id: StreamId) -> Result<&Stream> {
        self.streams.get(id)
    }

    fn add_stream(&mut self, stream: Stream) -> Result<StreamId> {
        self.ensure_clear()?;
        Ok(self.streams.alloc(stream))
    }

    pub fn open_memory(&mut self, data: Vec<u8>) -> Result<StreamId> {
        self.add_stream(Stream::from_memory(data))
    }

    pub fn open_file(&mut self, file: File) -> Result<StreamId> {
        self.ensure_clear()?;
        let stream = Stream::from_file(file);
        let stream = self.guard(stream)?;
        self.add_stream(stream)
    }

    pub fn open_path(&mut self, path: impl AsRef<Path>) -> Result<StreamId> {
        self.ensure_clear()?;
        let stream = Stream::open(path);
        let stream = self.guard(stream)?;
        self.add_stream(stream)
    }

    /// Child stream over the content of `bytes`, with its own cursor and
    /// an empty bit backlog.
    pub fn stream_from_bytes(&mut self, bytes: &Bytes) -> Result<StreamId> {
        self.ensure_clear()?;
        let result = self.substream_of(bytes);
        let child = self.guard(result)?;
        Ok(self.streams.alloc(child))
    }

    fn substream_of(&self, bytes: &Bytes) -> Result<Stream> {
        match bytes.payload {
            Payload::Lazy { stream, pos, len } => {
                let parent = self.streams.get(stream)?;
                let origin = parent.origin() + pos;
                trace!(origin, len, "substream over lazy bytes");
                Ok(Stream::over(
                    Rc::clone(parent.source()),
                    origin,
                    len,
                    Some(stream),
                ))
            }
            Payload::Owned(slot) => {
                let data = self.buffers.get(slot)?.clone();
                let parent = self.handles.get(bytes.handle)?.stream;
                let len = data.len() as u64;
                trace!(len, "substream over owned bytes");
                Ok(Stream::over(
                    Rc::new(Source::Memory(data)),
                    0,
                    len,
                    Some(parent),
                ))
            }
        }
    }

    /// Top-level stream `id` was ultimately carved from.
    pub fn root_of_stream(&self, id: StreamId) -> Result<StreamId> {
        let mut current = id;
        while let Some(parent) = self.streams.get(current)?.parent() {
            current = parent;
        }
        Ok(current)
    }

    /// Number of parent links between `id` and its root.
    pub fn stream_depth(&self, id: StreamId) -> Result<usize> {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.streams.get(current)?.parent() {
            current = parent;
            depth += 1;
        }
        Ok(depth)
    }

    /// Records a new handle at the current position of `stream`.
    pub(crate) fn new_handle(
        &mut self,
        stream: StreamId,
        tag: TypeTag,
        element_size: usize,
    ) -> Result<HandleId> {
        let pos = self.streams.get(stream)?.pos();
        Ok(self.handles.alloc(Handle {
            stream,
            pos,
            tag,
            element_size,
            parent: None,
        }))
    }

    /// Handle for a generated structure about to be read from `stream`.
    pub fn new_struct_handle(&mut self, stream: StreamId) -> Result<HandleId> {
        self.ensure_clear()?;
        let result = self.new_handle(stream, TypeTag::UserType, 0);
        self.guard(result)
    }

    pub fn handle(&self, value: &impl HasHandle) -> Result<&Handle> {
        self.handles.get(value.handle())
    }

    pub fn set_parent(&mut self, child: &impl HasHandle, parent: &impl HasHandle) -> Result<()> {
        self.ensure_clear()?;
        let result = self.link(child.handle(), parent.handle());
        self.guard(result)
    }

    /// Parent chains stay acyclic: linking under `child` itself or one of
    /// its descendants is refused.
    fn link(&mut self, child: HandleId, parent: HandleId) -> Result<()> {
        let mut current = Some(parent);
        while let Some(id) = current {
            if id == child {
                return Err(Error::ValidationFailed(format!(
                    "{child:?} cannot be linked under {parent:?}: parent chain would form a cycle"
                )));
            }
            current = self.handles.get(id)?.parent;
        }

        self.handles.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn parent_of(&self, value: &impl HasHandle) -> Result<Option<HandleId>> {
        Ok(self.handles.get(value.handle())?.parent)
    }

    /// Outermost structure `value` belongs to.
    pub fn root_of(&self, value: &impl HasHandle) -> Result<HandleId> {
        let mut current = value.handle();
        while let Some(parent) = self.handles.get(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    pub fn depth(&self, value: &impl HasHandle) -> Result<usize> {
        let mut depth = 0;
        let mut current = value.handle();
        while let Some(parent) = self.handles.get(current)?.parent {
            current = parent;
            depth += 1;
        }
        Ok(depth)
    }

    /// Wraps a session-owned buffer as a Bytes value on `stream`.
    pub(crate) fn owned_bytes(&mut self, stream: StreamId, data: Vec<u8>) -> Result<Bytes> {
        let handle = self.new_handle(stream, TypeTag::Bytes, 0)?;
        let slot = self.buffers.alloc(data);
        Ok(Bytes {
            handle,
            payload: Payload::Owned(slot),
        })
    }

    pub(crate) fn owned_string(&mut self, stream: StreamId, text: String) -> Result<KsString> {
        let handle = self.new_handle(stream, TypeTag::String, 0)?;
        let slot = self.strings.alloc(text);
        Ok(KsString { handle, slot })
    }

    pub(crate) fn owned_array(&mut self, stream: StreamId, data: ArrayData) -> Result<Array> {
        let handle = self.new_handle(stream, data.type_tag(), data.element_size())?;
        let slot: Slot<ArrayData> = self.arrays.alloc(data);
        Ok(Array { handle, slot })
    }

    pub fn stats(&self) -> ArenaStats {
        self.streams.stats()
            + self.handles.stats()
            + self.buffers.stats()
            + self.strings.stats()
            + self.arrays.stats()
    }

    /// Tears the session down, releasing every arena at once.
    pub fn destroy(self) -> ArenaStats {
        let stats = self.stats();
        drop(self);
        stats
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let stats = self.stats();
        debug!(
            blocks = stats.blocks,
            slots = stats.slots,
            cache_hits = stats.cache_hits,
            cache_misses = stats.cache_misses,
            "session destroyed"
        );
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("error", &self.error)
            .finish()
    }
}
