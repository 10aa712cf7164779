//! The optimistic cart engine.

use crate::{MutationSink, SyncError, SyncResult};
use cart_protocol::{
    AddonSelection, CartItem, CartOp, CartSnapshot, ClientMessage, MutationEnvelope,
};
use cart_pricing::{resolve_selections, MenuItemRef};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Transient notices surfaced to the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncNotice {
    /// A mutation referenced a stale version; the next canonical broadcast
    /// or snapshot will converge.
    VersionConflict { detail: Option<String> },
    /// Local state may have diverged; a snapshot fetch is needed.
    SnapshotNeeded,
}

/// Callback type for sync notices.
pub type SyncNoticeCallback = Box<dyn Fn(SyncNotice) + Send + Sync>;

/// The locally-known cart plus the machinery to mutate it optimistically
/// and reconcile it against canonical broadcasts.
///
/// An explicitly owned instance passed by handle to callers; processing is
/// serial per device, so methods take `&mut self`. True concurrency only
/// exists across devices and is arbitrated by the server through version
/// numbers.
pub struct SyncEngine {
    /// This device's member public ID (owner of new items).
    member_pid: String,
    items: Vec<CartItem>,
    cart_version: u64,
    /// True while an order is in flight; all mutating operations reject.
    locked: bool,
    /// Tmp ids already folded into canonical items. A replayed canonical
    /// `create` for one of these is a no-op merge, not a duplicate append.
    reconciled_tmp_ids: HashSet<String>,
    /// Set after a version conflict until a snapshot reseeds local state.
    needs_snapshot: bool,
    /// Mutations require a validated table password before being sent.
    password_required: bool,
    password_validated: bool,
    /// Envelopes held back while the password gate is closed, FIFO.
    gated_queue: VecDeque<ClientMessage>,
    sink: Arc<dyn MutationSink>,
    notice_callback: Option<SyncNoticeCallback>,
}

/// Generate a fresh client-chosen temporary id for a `create` mutation.
pub fn new_tmp_id() -> String {
    format!("tmp-{}", uuid::Uuid::new_v4())
}

impl SyncEngine {
    /// Create an engine for the given member, delivering mutations through
    /// the given sink.
    pub fn new(member_pid: impl Into<String>, sink: Arc<dyn MutationSink>) -> Self {
        Self {
            member_pid: member_pid.into(),
            items: Vec::new(),
            cart_version: 0,
            locked: false,
            reconciled_tmp_ids: HashSet::new(),
            needs_snapshot: false,
            password_required: false,
            password_validated: false,
            gated_queue: VecDeque::new(),
            sink,
            notice_callback: None,
        }
    }

    /// Set a callback for transient notices (conflicts, snapshot needed).
    pub fn set_notice_callback(&mut self, callback: SyncNoticeCallback) {
        self.notice_callback = Some(callback);
    }

    fn notify(&self, notice: SyncNotice) {
        if let Some(cb) = self.notice_callback.as_ref() {
            cb(notice);
        }
    }

    // ==========================================
    // Read access
    // ==========================================

    /// Current cart items, shadow items included.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whole-cart monotonic version.
    pub fn cart_version(&self) -> u64 {
        self.cart_version
    }

    /// True when the cart accepts mutations (no order in flight).
    pub fn is_cart_editable(&self) -> bool {
        !self.locked
    }

    /// True when the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True after a conflict until a snapshot reseeds local state.
    pub fn needs_snapshot(&self) -> bool {
        self.needs_snapshot
    }

    /// Sum of `final_price * qty` over all items, minor units.
    pub fn cart_total(&self) -> i64 {
        self.items
            .iter()
            .map(|i| i.final_price * i64::from(i.qty))
            .sum()
    }

    fn ensure_editable(&self) -> SyncResult<()> {
        if self.locked {
            return Err(SyncError::CartLocked);
        }
        Ok(())
    }

    // ==========================================
    // Optimistic mutations
    // ==========================================

    /// Add a new line optimistically and emit a `create` mutation.
    ///
    /// The shadow item is keyed by `tmp_id` until the canonical `create`
    /// broadcast swaps in the server-assigned id.
    pub fn add_optimistic(
        &mut self,
        menu_item: &MenuItemRef,
        qty: u32,
        note: &str,
        tmp_id: &str,
        variation_id: Option<&str>,
        addons: &[AddonSelection],
    ) -> SyncResult<()> {
        self.ensure_editable()?;
        if qty == 0 {
            return Err(SyncError::InvalidQuantity(qty));
        }

        let resolved = resolve_selections(menu_item, variation_id, addons);

        self.items.push(CartItem {
            public_id: tmp_id.to_string(),
            member_pid: self.member_pid.clone(),
            menu_item_pid: menu_item.menu_item_id.clone(),
            qty,
            note: note.to_string(),
            selected_variation: resolved.variation,
            selected_addons: resolved.addons,
            final_price: resolved.unit_price,
            version: 0,
            is_pending: true,
        });

        debug!(tmp_id, qty, unit_price = resolved.unit_price, "Optimistic add");

        self.send_or_queue(ClientMessage::mutation(MutationEnvelope::create(
            tmp_id,
            &menu_item.menu_item_id,
            qty,
            note,
            variation_id,
            addons.to_vec(),
        )));
        Ok(())
    }

    /// Update quantity/note optimistically and emit an `update` mutation
    /// carrying the last-known version.
    pub fn update_optimistic(
        &mut self,
        public_id: &str,
        qty: u32,
        note: &str,
        known_version: u64,
    ) -> SyncResult<()> {
        self.ensure_editable()?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.public_id == public_id)
            .ok_or_else(|| SyncError::UnknownItem(public_id.to_string()))?;

        item.qty = qty;
        item.note = note.to_string();
        // Local shadow bump for UI freshness only; the canonical version
        // arrives with the broadcast.
        item.version += 1;

        debug!(public_id, qty, known_version, "Optimistic update");

        self.send_or_queue(ClientMessage::mutation(MutationEnvelope::update(
            public_id,
            qty,
            note,
            known_version,
        )));
        Ok(())
    }

    /// Substitute an item's referenced menu item and customization entirely,
    /// repricing it, and emit a `replace` mutation.
    #[allow(clippy::too_many_arguments)]
    pub fn replace_optimistic(
        &mut self,
        public_id: &str,
        menu_item: &MenuItemRef,
        qty: u32,
        note: &str,
        known_version: u64,
        variation_id: Option<&str>,
        addons: &[AddonSelection],
    ) -> SyncResult<()> {
        self.ensure_editable()?;

        let resolved = resolve_selections(menu_item, variation_id, addons);

        let item = self
            .items
            .iter_mut()
            .find(|i| i.public_id == public_id)
            .ok_or_else(|| SyncError::UnknownItem(public_id.to_string()))?;

        item.menu_item_pid = menu_item.menu_item_id.clone();
        item.qty = qty;
        item.note = note.to_string();
        item.selected_variation = resolved.variation;
        item.selected_addons = resolved.addons;
        item.final_price = resolved.unit_price;
        item.version += 1;

        debug!(public_id, known_version, "Optimistic replace");

        self.send_or_queue(ClientMessage::mutation(MutationEnvelope::replace(
            public_id,
            &menu_item.menu_item_id,
            qty,
            note,
            known_version,
            variation_id,
            addons.to_vec(),
        )));
        Ok(())
    }

    /// Remove a line optimistically and emit a `delete` mutation.
    pub fn delete_optimistic(&mut self, public_id: &str, known_version: u64) -> SyncResult<()> {
        self.ensure_editable()?;

        let before = self.items.len();
        self.items.retain(|i| i.public_id != public_id);
        if self.items.len() == before {
            return Err(SyncError::UnknownItem(public_id.to_string()));
        }

        debug!(public_id, known_version, "Optimistic delete");

        self.send_or_queue(ClientMessage::mutation(MutationEnvelope::delete(
            public_id,
            known_version,
        )));
        Ok(())
    }

    // ==========================================
    // Canonical state
    // ==========================================

    /// Apply a canonical `cart_update` broadcast. The sole mutator of
    /// canonical state: whatever the server says overwrites any local
    /// interim edits for the matched item.
    pub fn reconcile(
        &mut self,
        op: CartOp,
        item: Option<CartItem>,
        public_id: Option<&str>,
        tmp_id: Option<&str>,
        cart_version: u64,
    ) {
        match op {
            CartOp::Create => {
                let Some(mut canonical) = item else {
                    warn!("Canonical create without item payload, ignoring");
                    return;
                };
                canonical.is_pending = false;

                if let Some(tmp) = tmp_id {
                    if self.reconciled_tmp_ids.contains(tmp) {
                        // Replayed broadcast: merge into the already
                        // reconciled line instead of appending a duplicate.
                        debug!(tmp_id = tmp, "Duplicate canonical create, merging");
                        self.merge_canonical(canonical);
                    } else if let Some(shadow) =
                        self.items.iter_mut().find(|i| i.public_id == tmp)
                    {
                        *shadow = canonical;
                        self.reconciled_tmp_ids.insert(tmp.to_string());
                    } else {
                        self.items.push(canonical);
                        self.reconciled_tmp_ids.insert(tmp.to_string());
                    }
                } else {
                    // Another device's create.
                    self.merge_canonical(canonical);
                }
            }
            CartOp::Update | CartOp::Replace => {
                let Some(mut canonical) = item else {
                    warn!(?op, "Canonical update without item payload, ignoring");
                    return;
                };
                canonical.is_pending = false;
                self.merge_canonical(canonical);
            }
            CartOp::Delete => {
                let target = public_id
                    .map(|s| s.to_string())
                    .or_else(|| item.map(|i| i.public_id));
                if let Some(target) = target {
                    self.items.retain(|i| i.public_id != target);
                }
            }
        }

        self.cart_version = cart_version;
    }

    /// Replace the item matched by `public_id` with the canonical one, or
    /// append when no match exists.
    fn merge_canonical(&mut self, canonical: CartItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.public_id == canonical.public_id)
        {
            *existing = canonical;
        } else {
            self.items.push(canonical);
        }
    }

    /// The server reported a version mismatch on one of our mutations.
    ///
    /// No local auto-merge: mark that a snapshot is needed and surface a
    /// transient notice; the next canonical broadcast or snapshot converges.
    pub fn handle_conflict(&mut self, detail: Option<String>) {
        info!(?detail, "Version conflict, deferring to canonical state");
        self.needs_snapshot = true;
        self.notify(SyncNotice::VersionConflict { detail });
        self.notify(SyncNotice::SnapshotNeeded);
    }

    /// Seed local state deterministically from a REST snapshot (resume
    /// path). Clears all pending bookkeeping.
    pub fn seed_from_snapshot(&mut self, snapshot: CartSnapshot) {
        info!(
            items = snapshot.items.len(),
            cart_version = snapshot.cart_version,
            locked = snapshot.locked,
            "Seeding cart from snapshot"
        );
        self.items = snapshot.items;
        self.cart_version = snapshot.cart_version;
        self.locked = snapshot.locked;
        self.reconciled_tmp_ids.clear();
        self.needs_snapshot = false;
    }

    /// Set the order-lock state (driven by the order lock observer).
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Clear all items (after a confirmed order folds them away).
    pub fn clear_items(&mut self) {
        self.items.clear();
        self.reconciled_tmp_ids.clear();
    }

    // ==========================================
    // Password gate
    // ==========================================

    /// Require a validated table password before mutations are sent.
    /// Mutations issued while the gate is closed are queued, not dropped.
    pub fn require_password(&mut self) {
        self.password_required = true;
        self.password_validated = false;
    }

    /// The shared secret was validated; flush queued mutations in order.
    pub fn mark_password_validated(&mut self) {
        self.password_validated = true;
        let queued: Vec<ClientMessage> = self.gated_queue.drain(..).collect();
        if !queued.is_empty() {
            info!(count = queued.len(), "Flushing password-gated mutations");
        }
        for msg in queued {
            self.send(msg);
        }
    }

    fn send_or_queue(&mut self, msg: ClientMessage) {
        if self.password_required && !self.password_validated {
            debug!("Password gate closed, queueing mutation");
            self.gated_queue.push_back(msg);
            return;
        }
        self.send(msg);
    }

    fn send(&self, msg: ClientMessage) {
        // Local state is already applied; a delivery failure leaves the
        // cart consistent-but-stale and reconnect-and-resnapshot converges.
        if let Err(e) = self.sink.deliver(msg) {
            warn!(error = %e, "Failed to deliver mutation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_pricing::{Addon, AddonGroup, Variation, VariationGroup};
    use std::sync::Mutex;

    /// Sink that records everything delivered to it.
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<ClientMessage>>,
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<ClientMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl MutationSink for RecordingSink {
        fn deliver(&self, msg: ClientMessage) -> SyncResult<()> {
            self.sent.lock().unwrap().push(msg);
            Ok(())
        }
    }

    fn menu_item() -> MenuItemRef {
        MenuItemRef {
            menu_item_id: "menu-1".to_string(),
            base_price: 100,
            variation_groups: vec![VariationGroup {
                group_id: "size".to_string(),
                name: "Size".to_string(),
                variations: vec![Variation {
                    variation_id: "large".to_string(),
                    name: "Large".to_string(),
                    price: 20,
                    addon_groups: vec![],
                }],
            }],
            addon_groups: vec![AddonGroup {
                group_id: "toppings".to_string(),
                name: "Toppings".to_string(),
                addons: vec![Addon {
                    addon_id: "cheese".to_string(),
                    name: "Cheese".to_string(),
                    price: 5,
                }],
            }],
        }
    }

    fn engine() -> (SyncEngine, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (SyncEngine::new("mem-1", sink.clone()), sink)
    }

    fn canonical_item(public_id: &str, version: u64) -> CartItem {
        CartItem {
            public_id: public_id.to_string(),
            member_pid: "mem-1".to_string(),
            menu_item_pid: "menu-1".to_string(),
            qty: 1,
            note: String::new(),
            selected_variation: None,
            selected_addons: vec![],
            final_price: 100,
            version,
            is_pending: false,
        }
    }

    #[test]
    fn test_add_optimistic_appends_shadow_and_sends_create() {
        let (mut engine, sink) = engine();

        engine
            .add_optimistic(&menu_item(), 2, "no salt", "tmp-1", None, &[])
            .unwrap();

        assert_eq!(engine.items().len(), 1);
        let item = &engine.items()[0];
        assert_eq!(item.public_id, "tmp-1");
        assert!(item.is_pending);
        assert_eq!(item.final_price, 100);
        assert_eq!(item.version, 0);

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            ClientMessage::CartMutation { mutation } => {
                assert_eq!(mutation.op, CartOp::Create);
                assert_eq!(mutation.tmp_id.as_deref(), Some("tmp-1"));
            }
            other => panic!("wrong message: {:?}", other),
        }
    }

    #[test]
    fn test_add_optimistic_prices_via_resolver() {
        let (mut engine, _sink) = engine();

        engine
            .add_optimistic(
                &menu_item(),
                1,
                "",
                "tmp-1",
                Some("large"),
                &[AddonSelection {
                    addon_id: "cheese".to_string(),
                    qty: 2,
                }],
            )
            .unwrap();

        assert_eq!(engine.items()[0].final_price, 100 + 20 + 10);
        assert_eq!(engine.cart_total(), 130);
    }

    #[test]
    fn test_add_zero_qty_rejected() {
        let (mut engine, sink) = engine();
        let result = engine.add_optimistic(&menu_item(), 0, "", "tmp-1", None, &[]);
        assert!(matches!(result, Err(SyncError::InvalidQuantity(0))));
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn test_reconcile_create_replaces_shadow_by_tmp_id() {
        let (mut engine, _sink) = engine();
        engine
            .add_optimistic(&menu_item(), 1, "", "tmp-1", None, &[])
            .unwrap();

        let canonical = canonical_item("itm-1", 1);
        engine.reconcile(CartOp::Create, Some(canonical), None, Some("tmp-1"), 5);

        assert_eq!(engine.items().len(), 1);
        assert_eq!(engine.items()[0].public_id, "itm-1");
        assert!(!engine.items()[0].is_pending);
        assert_eq!(engine.cart_version(), 5);
    }

    #[test]
    fn test_duplicate_create_broadcast_is_idempotent() {
        let (mut engine, _sink) = engine();
        engine
            .add_optimistic(&menu_item(), 1, "", "tmp-1", None, &[])
            .unwrap();

        let canonical = canonical_item("itm-1", 1);
        engine.reconcile(
            CartOp::Create,
            Some(canonical.clone()),
            None,
            Some("tmp-1"),
            5,
        );
        engine.reconcile(CartOp::Create, Some(canonical), None, Some("tmp-1"), 5);

        assert_eq!(engine.items().len(), 1);
    }

    #[test]
    fn test_reconcile_create_without_shadow_appends() {
        let (mut engine, _sink) = engine();

        // Another device's create arrives with its own tmp id.
        engine.reconcile(
            CartOp::Create,
            Some(canonical_item("itm-9", 1)),
            None,
            Some("their-tmp"),
            3,
        );

        assert_eq!(engine.items().len(), 1);
        assert_eq!(engine.items()[0].public_id, "itm-9");
    }

    #[test]
    fn test_reconcile_update_overwrites_local_interim_edits() {
        let (mut engine, _sink) = engine();
        engine.reconcile(
            CartOp::Create,
            Some(canonical_item("itm-1", 1)),
            None,
            None,
            1,
        );

        // Local interim edit...
        engine.update_optimistic("itm-1", 5, "mine", 1).unwrap();

        // ...is discarded when the canonical update lands.
        let mut canonical = canonical_item("itm-1", 2);
        canonical.qty = 3;
        canonical.note = "theirs".to_string();
        engine.reconcile(CartOp::Update, Some(canonical), None, None, 2);

        let item = &engine.items()[0];
        assert_eq!(item.qty, 3);
        assert_eq!(item.note, "theirs");
        assert_eq!(item.version, 2);
    }

    #[test]
    fn test_reconcile_delete_removes_item() {
        let (mut engine, _sink) = engine();
        engine.reconcile(
            CartOp::Create,
            Some(canonical_item("itm-1", 1)),
            None,
            None,
            1,
        );

        engine.reconcile(CartOp::Delete, None, Some("itm-1"), None, 2);

        assert!(engine.is_empty());
        assert_eq!(engine.cart_version(), 2);
    }

    #[test]
    fn test_two_devices_converge() {
        let sink_a = Arc::new(RecordingSink::default());
        let sink_b = Arc::new(RecordingSink::default());
        let mut device_a = SyncEngine::new("mem-a", sink_a);
        let mut device_b = SyncEngine::new("mem-b", sink_b);

        // Device A creates optimistically; device B edits the same item
        // optimistically after A's create is confirmed. The server
        // serializes both into one broadcast stream.
        device_a
            .add_optimistic(&menu_item(), 1, "", "tmp-a", None, &[])
            .unwrap();

        let confirmed = canonical_item("itm-1", 1);
        let broadcasts = vec![
            (CartOp::Create, Some(confirmed), None, Some("tmp-a"), 1u64),
            (
                CartOp::Update,
                Some({
                    let mut i = canonical_item("itm-1", 2);
                    i.qty = 4;
                    i
                }),
                None,
                None,
                2u64,
            ),
        ];

        // Both devices make conflicting interim edits.
        device_b.reconcile(
            CartOp::Create,
            Some(canonical_item("itm-1", 1)),
            None,
            Some("tmp-a"),
            1,
        );
        device_b.update_optimistic("itm-1", 4, "", 1).unwrap();
        // Device A edits its still-pending shadow and loses.
        device_a.update_optimistic("tmp-a", 9, "mine", 0).unwrap();

        // Apply the full broadcast stream on both.
        for (op, item, public_id, tmp_id, v) in broadcasts {
            device_a.reconcile(op, item.clone(), public_id, tmp_id, v);
            device_b.reconcile(op, item, public_id, tmp_id, v);
        }

        assert_eq!(device_a.items(), device_b.items());
        assert_eq!(device_a.cart_version(), device_b.cart_version());
        assert_eq!(device_a.items()[0].version, 2);
        assert_eq!(device_a.items()[0].qty, 4);
    }

    #[test]
    fn test_locked_cart_rejects_all_mutations() {
        let (mut engine, sink) = engine();
        engine.reconcile(
            CartOp::Create,
            Some(canonical_item("itm-1", 1)),
            None,
            None,
            1,
        );
        engine.set_locked(true);

        assert!(matches!(
            engine.add_optimistic(&menu_item(), 1, "", "tmp-2", None, &[]),
            Err(SyncError::CartLocked)
        ));
        assert!(matches!(
            engine.update_optimistic("itm-1", 2, "", 1),
            Err(SyncError::CartLocked)
        ));
        assert!(matches!(
            engine.delete_optimistic("itm-1", 1),
            Err(SyncError::CartLocked)
        ));

        // Nothing was sent and nothing changed.
        assert_eq!(sink.sent().len(), 0);
        assert_eq!(engine.items().len(), 1);

        engine.set_locked(false);
        assert!(engine.update_optimistic("itm-1", 2, "", 1).is_ok());
    }

    #[test]
    fn test_update_unknown_item() {
        let (mut engine, _sink) = engine();
        assert!(matches!(
            engine.update_optimistic("ghost", 1, "", 0),
            Err(SyncError::UnknownItem(_))
        ));
    }

    #[test]
    fn test_delete_optimistic_removes_and_sends() {
        let (mut engine, sink) = engine();
        engine.reconcile(
            CartOp::Create,
            Some(canonical_item("itm-1", 1)),
            None,
            None,
            1,
        );

        engine.delete_optimistic("itm-1", 1).unwrap();

        assert!(engine.is_empty());
        match &sink.sent()[0] {
            ClientMessage::CartMutation { mutation } => {
                assert_eq!(mutation.op, CartOp::Delete);
                assert_eq!(mutation.version, Some(1));
            }
            other => panic!("wrong message: {:?}", other),
        }
    }

    #[test]
    fn test_replace_optimistic_reprices() {
        let (mut engine, sink) = engine();
        engine.reconcile(
            CartOp::Create,
            Some(canonical_item("itm-1", 1)),
            None,
            None,
            1,
        );

        engine
            .replace_optimistic("itm-1", &menu_item(), 1, "", 1, Some("large"), &[])
            .unwrap();

        assert_eq!(engine.items()[0].final_price, 120);
        assert_eq!(
            engine.items()[0].selected_variation.as_ref().unwrap().price,
            20
        );
        match &sink.sent()[0] {
            ClientMessage::CartMutation { mutation } => {
                assert_eq!(mutation.op, CartOp::Replace);
                assert_eq!(
                    mutation.selected_item_variation_id.as_deref(),
                    Some("large")
                );
            }
            other => panic!("wrong message: {:?}", other),
        }
    }

    #[test]
    fn test_conflict_defers_and_notifies() {
        let (mut engine, _sink) = engine();
        let notices: Arc<Mutex<Vec<SyncNotice>>> = Arc::new(Mutex::new(Vec::new()));
        let notices_clone = notices.clone();
        engine.set_notice_callback(Box::new(move |n| {
            notices_clone.lock().unwrap().push(n);
        }));

        engine.handle_conflict(Some("stale version".to_string()));

        assert!(engine.needs_snapshot());
        let seen = notices.lock().unwrap();
        assert_eq!(
            seen[0],
            SyncNotice::VersionConflict {
                detail: Some("stale version".to_string())
            }
        );
        assert_eq!(seen[1], SyncNotice::SnapshotNeeded);
    }

    #[test]
    fn test_snapshot_seeds_state_and_clears_conflict() {
        let (mut engine, _sink) = engine();
        engine.handle_conflict(None);

        engine.seed_from_snapshot(CartSnapshot {
            items: vec![canonical_item("itm-5", 3)],
            cart_version: 9,
            locked: true,
            members: vec![],
            order_history: vec![],
        });

        assert!(!engine.needs_snapshot());
        assert_eq!(engine.cart_version(), 9);
        assert!(!engine.is_cart_editable());
        assert_eq!(engine.items()[0].public_id, "itm-5");
    }

    #[test]
    fn test_password_gate_queues_then_flushes_in_order() {
        let (mut engine, sink) = engine();
        engine.require_password();

        engine
            .add_optimistic(&menu_item(), 1, "first", "tmp-1", None, &[])
            .unwrap();
        engine
            .add_optimistic(&menu_item(), 1, "second", "tmp-2", None, &[])
            .unwrap();

        // Local state applied, nothing sent yet.
        assert_eq!(engine.items().len(), 2);
        assert!(sink.sent().is_empty());

        engine.mark_password_validated();

        let sent = sink.sent();
        assert_eq!(sent.len(), 2);
        let tmp_ids: Vec<_> = sent
            .iter()
            .map(|m| match m {
                ClientMessage::CartMutation { mutation } => mutation.tmp_id.clone().unwrap(),
                other => panic!("wrong message: {:?}", other),
            })
            .collect();
        assert_eq!(tmp_ids, vec!["tmp-1", "tmp-2"]);

        // After validation, mutations flow straight through.
        engine
            .add_optimistic(&menu_item(), 1, "", "tmp-3", None, &[])
            .unwrap();
        assert_eq!(sink.sent().len(), 3);
    }

    #[test]
    fn test_clear_items_after_order() {
        let (mut engine, _sink) = engine();
        engine.reconcile(
            CartOp::Create,
            Some(canonical_item("itm-1", 1)),
            None,
            None,
            1,
        );

        engine.clear_items();
        assert!(engine.is_empty());
        assert_eq!(engine.cart_total(), 0);
    }
}
