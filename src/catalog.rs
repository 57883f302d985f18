/*
    FloppyBay
    https://github.com/dbalsom/floppybay

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/catalog.rs

    The Multi-Image Catalog and Swap Bridge: the host-facing owner of every
    catalog slot and both drives.
*/

//! A [Catalog] is the single owner of all removable storage state: the slots a host frontend has
//! filled with disk images, the two [DriveState]s, the frame tick that drives their transition
//! timers, and the capabilities (protected codec, save store) used while decoding and persisting.
//!
//! Hosts drive it with the slot operations ([Catalog::add], [Catalog::replace],
//! [Catalog::select], [Catalog::set_inserted]); the emulated disk controller uses the sector and
//! write-protect operations; the frame loop calls [Catalog::advance_frame] once per vertical
//! blank.

use crate::{
    config::{FloppyConfig, WriteProtection},
    disk_image::DiskImage,
    drive::DriveState,
    protected::{BoxedCodec, ProtectedCodec, UnavailableCodec},
    save_store::{BoxedSaveStore, MemorySaveStore, SaveStore},
    types::{DriveId, TransitionKind, WriteProtectOverride},
    FloppyError,
    MAX_DISKS,
    MAX_DRIVES,
};

pub struct Catalog {
    pub(crate) config: FloppyConfig,
    pub(crate) slots: Vec<DiskImage>,
    pub(crate) drives: [DriveState; MAX_DRIVES],
    pub(crate) codec: BoxedCodec,
    pub(crate) save_store: BoxedSaveStore,
    pub(crate) tick: u64,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(FloppyConfig::default())
    }
}

impl Catalog {
    /// Create an empty catalog. Protected formats are refused and saves are kept in memory until
    /// [Catalog::with_codec] and [Catalog::with_save_store] say otherwise.
    pub fn new(config: FloppyConfig) -> Catalog {
        let delay = config.transition_delay;
        Catalog {
            config,
            slots: Vec::with_capacity(MAX_DISKS),
            drives: [DriveState::new(DriveId::A, delay), DriveState::new(DriveId::B, delay)],
            codec: Box::new(UnavailableCodec),
            save_store: Box::new(MemorySaveStore::new()),
            tick: 0,
        }
    }

    pub fn with_codec<C: ProtectedCodec + Send + Sync + 'static>(mut self, codec: C) -> Catalog {
        log::debug!("Catalog::with_codec(): using protected codec {}", codec.name());
        self.codec = Box::new(codec);
        self
    }

    pub fn with_save_store<S: SaveStore + Send + Sync + 'static>(mut self, store: S) -> Catalog {
        self.save_store = Box::new(store);
        self
    }

    pub fn config(&self) -> &FloppyConfig {
        &self.config
    }

    /// Apply new host policy. A changed transition delay affects transitions already pending.
    pub fn set_config(&mut self, config: FloppyConfig) {
        for drive in self.drives.iter_mut() {
            drive.transition.set_delay(config.transition_delay);
        }
        self.config = config;
    }

    pub fn codec(&self) -> &dyn ProtectedCodec {
        self.codec.as_ref()
    }

    pub fn save_store(&self) -> &dyn SaveStore {
        self.save_store.as_ref()
    }

    /// The current frame tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance the frame tick by one vertical blank.
    pub fn advance_frame(&mut self) {
        self.tick = self.tick.saturating_add(1);
    }

    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn drive(&self, drive: DriveId) -> &DriveState {
        &self.drives[drive.index()]
    }

    pub fn slot(&self, slot: usize) -> Option<&DiskImage> {
        self.slots.get(slot)
    }

    pub fn count_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn active_slot(&self, drive: DriveId) -> Option<usize> {
        self.drives[drive.index()].active_slot
    }

    pub fn is_inserted(&self, drive: DriveId) -> bool {
        self.drives[drive.index()].inserted
    }

    /// Append an empty slot and return its index.
    pub fn add(&mut self) -> Result<usize, FloppyError> {
        if self.slots.len() >= MAX_DISKS {
            log::warn!("Catalog::add(): catalog is full ({} slots)", MAX_DISKS);
            return Err(FloppyError::CatalogFull);
        }
        self.slots.push(DiskImage::default());
        log::debug!("Catalog::add(): added slot {}", self.slots.len() - 1);
        Ok(self.slots.len() - 1)
    }

    /// Decode `bytes` into `slot`. Any drive presenting the slot is ejected first, which may
    /// persist its modified content. When saving is enabled, a name is given and the save store
    /// already holds an image of that name, the saved image is decoded instead of `bytes`.
    ///
    /// On a decode failure the slot is left empty but keeps its name, so the host can still show
    /// a label for it.
    pub fn replace(&mut self, slot: usize, name: Option<&str>, bytes: &[u8]) -> Result<(), FloppyError> {
        if slot >= self.slots.len() {
            return Err(FloppyError::InvalidSlot(slot));
        }

        for drive in [DriveId::A, DriveId::B] {
            let state = &self.drives[drive.index()];
            if state.inserted && state.active_slot == Some(slot) {
                self.eject(drive, true);
            }
        }

        let display_name = match name {
            Some(name) => crate::util::split_file_name(name).0.to_string(),
            None => format!("<Image {}>.st", slot),
        };

        let saved_bytes = match name {
            Some(_) if self.config.save_enabled => self.save_store.load(&display_name),
            _ => None,
        };
        let saved = saved_bytes.is_some();
        if saved {
            log::info!("Catalog::replace(): using saved image for {}", display_name);
        }
        let source = saved_bytes.as_deref().unwrap_or(bytes);

        match DiskImage::decode(name, source, self.codec.as_ref()) {
            Ok(mut image) => {
                log::debug!(
                    "Catalog::replace(): slot {} <- {} ({}, {} bytes)",
                    slot,
                    display_name,
                    image.kind(),
                    image.data().len()
                );
                image.display_name = display_name;
                image.saved = saved;
                self.slots[slot] = image;
                Ok(())
            }
            Err(e) => {
                log::error!("Catalog::replace(): could not load {}: {}", display_name, e);
                self.slots[slot] = DiskImage::empty(&display_name);
                Err(e)
            }
        }
    }

    /// Choose which slot `drive` presents on its next insert. Changing the selection of an
    /// inserted drive ejects it.
    pub fn select(&mut self, drive: DriveId, slot: usize) -> Result<(), FloppyError> {
        if slot >= self.slots.len() {
            return Err(FloppyError::InvalidSlot(slot));
        }
        if self.drives[drive.index()].active_slot == Some(slot) {
            return Ok(());
        }
        if self.drives[drive.index()].inserted {
            self.eject(drive, true);
        }
        log::debug!("Catalog::select(): {} selects slot {}", drive, slot);
        self.drives[drive.index()].active_slot = Some(slot);
        Ok(())
    }

    /// Insert or eject the disk of `drive`. Both directions are idempotent. Ejecting always
    /// succeeds; inserting fails if no slot is selected or the selected slot has no content.
    pub fn set_inserted(&mut self, drive: DriveId, inserted: bool) -> Result<(), FloppyError> {
        if inserted {
            self.insert(drive)
        }
        else {
            self.eject(drive, true);
            Ok(())
        }
    }

    fn insert(&mut self, drive: DriveId) -> Result<(), FloppyError> {
        let idx = drive.index();
        if self.drives[idx].inserted {
            return Ok(());
        }
        let slot = self.drives[idx].active_slot.ok_or(FloppyError::NoImageSelected)?;

        // A slot may only be presented by one drive at a time.
        let other = &self.drives[drive.other().index()];
        if other.inserted && other.active_slot == Some(slot) {
            log::debug!(
                "Catalog::insert(): slot {} is in {}, ejecting it first",
                slot,
                drive.other()
            );
            self.eject(drive.other(), true);
        }

        let image = match self.slots.get(slot) {
            Some(image) if image.is_populated() => image.clone(),
            _ => {
                log::warn!("Catalog::insert(): slot {} has no content for {}", slot, drive);
                return Err(FloppyError::ImageUnavailable);
            }
        };

        let tick = self.tick;
        let state = &mut self.drives[idx];
        state.present(slot, image);
        if !state.ok_to_persist && !state.image().is_some_and(|image| image.boot_sector_ok()) {
            log::warn!(
                "Catalog::insert(): {} boot sector is not trustworthy, changes to this disk will not be saved",
                drive
            );
        }
        state.transition.schedule(TransitionKind::Insert, tick);

        log::info!(
            "Catalog::insert(): inserted {} into {} {}",
            state.image().map_or("", |image| image.name()),
            drive,
            state.geometry()
        );
        Ok(())
    }

    /// Eject `drive`, persisting modified content when `persist` is set and host policy allows.
    pub(crate) fn eject(&mut self, drive: DriveId, persist: bool) {
        let idx = drive.index();
        if !self.drives[idx].inserted {
            return;
        }

        let tick = self.tick;
        let state = &mut self.drives[idx];
        let slot = state.active_slot;
        let ok_to_persist = state.ok_to_persist;
        let image = state.remove();
        state.transition.schedule(TransitionKind::Eject, tick);

        if let Some(image) = image {
            log::info!("Catalog::eject(): ejected {} from {}", image.name(), drive);
            if image.is_modified() {
                if persist {
                    self.persist(slot, image, ok_to_persist);
                }
                else {
                    log::debug!("Catalog::eject(): discarding changes to {}", image.name());
                }
            }
        }
    }

    fn persist(&mut self, slot: Option<usize>, mut image: DiskImage, ok_to_persist: bool) {
        if !ok_to_persist {
            log::warn!("Catalog::persist(): writing {} is not possible, changes discarded", image.name());
            return;
        }
        let Some(format) = image.source_format() else {
            return;
        };

        let encoded = match image.encode_back(format) {
            Ok(encoded) => encoded,
            Err(e) => {
                log::warn!("Catalog::persist(): {}", FloppyError::PersistFailed(e.to_string()));
                return;
            }
        };

        if self.config.save_enabled {
            match self.save_store.store(image.name(), &encoded) {
                Ok(()) => log::info!("Catalog::persist(): saved {} ({} bytes)", image.name(), encoded.len()),
                Err(e) => log::warn!("Catalog::persist(): {}", FloppyError::PersistFailed(e.to_string())),
            }
        }
        else {
            log::debug!("Catalog::persist(): saving is disabled, {} kept for this session only", image.name());
        }

        // Keep the modified content so re-inserting the slot shows it for the rest of the session.
        if let Some(cached) = slot.and_then(|slot| self.slots.get_mut(slot)) {
            if cached.display_name == image.display_name {
                image.modified = false;
                image.saved = true;
                *cached = image;
            }
            else {
                log::info!("Catalog::persist(): {} is no longer cached", image.name());
            }
        }
    }

    /// The slot's display name.
    pub fn image_name(&self, slot: usize) -> Result<&str, FloppyError> {
        self.slots
            .get(slot)
            .map(|image| image.name())
            .ok_or(FloppyError::InvalidSlot(slot))
    }

    /// The slot's display name, prefixed with the drive currently presenting it.
    pub fn label(&self, slot: usize) -> Result<String, FloppyError> {
        let name = self.image_name(slot)?;
        let prefix = self
            .drives
            .iter()
            .find(|state| state.inserted && state.active_slot == Some(slot))
            .map(|state| format!("[{}] ", state.id))
            .unwrap_or_default();
        Ok(format!("{}{}", prefix, name))
    }

    /// Read `count` sectors from the disk in `drive`. A negative count reads the rest of the
    /// track.
    pub fn read_sectors(
        &self,
        drive: DriveId,
        track: u16,
        side: u16,
        sector: u16,
        count: i32,
    ) -> Result<&[u8], FloppyError> {
        self.drives[drive.index()].read_sectors(track, side, sector, count)
    }

    /// Write whole sectors to the disk in `drive`. Nothing is written if the drive is protected
    /// by host policy, by its own setting, or by a disk change in progress.
    pub fn write_sectors(
        &mut self,
        drive: DriveId,
        track: u16,
        side: u16,
        sector: u16,
        data: &[u8],
    ) -> Result<(), FloppyError> {
        let protected = self.config.write_protection == WriteProtection::On
            || self.drives[drive.index()].write_protected
            || self.current_write_protect_override(drive) == WriteProtectOverride::ForceProtected;
        self.drives[drive.index()].write_sectors(track, side, sector, data, protected)
    }

    /// The transition override for `drive` at the current tick.
    pub fn current_write_protect_override(&mut self, drive: DriveId) -> WriteProtectOverride {
        let tick = self.tick;
        self.drives[drive.index()].transition.current_override(tick)
    }

    /// The level of the write-protect line of `drive`: the transition override while a disk
    /// change is in progress, otherwise the static protection of the media. An empty drive reads
    /// as protected.
    pub fn write_protect_signal(&mut self, drive: DriveId) -> bool {
        match self.current_write_protect_override(drive) {
            WriteProtectOverride::ForceProtected => true,
            WriteProtectOverride::ForceUnprotected => false,
            WriteProtectOverride::None => {
                let state = &self.drives[drive.index()];
                !state.inserted || state.write_protected || self.config.write_protection == WriteProtection::On
            }
        }
    }

    pub fn set_write_protected(&mut self, drive: DriveId, state: bool) {
        log::debug!("Catalog::set_write_protected(): {} -> {}", drive, state);
        self.drives[drive.index()].write_protected = state;
    }

    /// Load a title consisting of a single disk image: clear the catalog, fill one slot and
    /// insert it into drive A.
    pub fn load_content(&mut self, name: Option<&str>, bytes: &[u8]) -> Result<(), FloppyError> {
        self.clear();
        let slot = self.add()?;
        self.replace(slot, name, bytes)?;
        self.select(DriveId::A, slot)?;
        self.set_inserted(DriveId::A, true)
    }

    /// Load a multi-disk title. Every image gets a slot; images that fail to decode leave an
    /// empty, named slot behind. `initial` is inserted into drive A and, when drive B is enabled,
    /// the image after it goes into drive B.
    pub fn load_playlist(&mut self, initial: usize, images: &[(Option<&str>, &[u8])]) -> Result<(), FloppyError> {
        self.clear();
        for (name, bytes) in images {
            let slot = self.add()?;
            if let Err(e) = self.replace(slot, *name, bytes) {
                log::warn!("Catalog::load_playlist(): slot {} left empty: {}", slot, e);
            }
        }
        if self.slots.is_empty() {
            return Err(FloppyError::NoImageSelected);
        }

        let initial = if initial < self.slots.len() { initial } else { 0 };
        self.select(DriveId::A, initial)?;
        self.set_inserted(DriveId::A, true)?;

        if self.config.drive_b_enabled && self.slots.len() > 1 {
            let second = (initial + 1) % self.slots.len();
            self.select(DriveId::B, second)?;
            if let Err(e) = self.set_inserted(DriveId::B, true) {
                log::warn!("Catalog::load_playlist(): could not insert slot {} into B: {}", second, e);
            }
        }
        Ok(())
    }

    /// Eject both drives, persisting as usual, then clear the catalog.
    pub fn unload_content(&mut self) {
        self.clear();
    }

    /// Remove every slot. Inserted drives are ejected first and may persist.
    pub fn clear(&mut self) {
        for drive in [DriveId::A, DriveId::B] {
            self.eject(drive, true);
            self.drives[drive.index()].active_slot = None;
        }
        self.slots.clear();
        log::debug!("Catalog::clear(): catalog cleared");
    }

    /// Eject and re-insert every inserted drive, as the mechanics do across a machine reset.
    /// Drive B is left alone when it is disabled. Both drives are attempted; the first insert
    /// error is returned.
    pub fn reinsert_all(&mut self) -> Result<(), FloppyError> {
        let mut result = Ok(());
        for drive in [DriveId::A, DriveId::B] {
            if drive == DriveId::B && !self.config.drive_b_enabled {
                continue;
            }
            if self.drives[drive.index()].inserted {
                self.eject(drive, true);
                if let Err(e) = self.insert(drive) {
                    log::warn!("Catalog::reinsert_all(): could not reinsert {}: {}", drive, e);
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
        }
        result
    }

    /// Cancel pending transitions on both drives.
    pub fn reset(&mut self) {
        for drive in self.drives.iter_mut() {
            drive.transition.reset();
        }
    }
}
