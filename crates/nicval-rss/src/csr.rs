use std::collections::BTreeMap;

use crate::ring::{Direction, RingId};
use crate::QueueId;

/// Which of a ring's two pointers to sample. Hardware advances the head as it consumes
/// descriptors; the driver advances the tail as it posts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RingPointer {
    #[default]
    Head,
    Tail,
}

/// Head/tail pointer registers of one descriptor ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RingRegisters {
    pub head: u32,
    pub tail: u32,
}

impl RingRegisters {
    pub fn address(&self, pointer: RingPointer) -> u32 {
        match pointer {
            RingPointer::Head => self.head,
            RingPointer::Tail => self.tail,
        }
    }
}

/// Register topology of a device family: where queue 0's pointers live and how far apart
/// consecutive queues are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCsrLayout {
    pub rx_head: u32,
    pub rx_tail: u32,
    pub tx_head: u32,
    pub tx_tail: u32,
    pub queue_stride: u32,
}

impl RingCsrLayout {
    /// 8254x-style layout: RDH/RDT at 0x2810/0x2818, TDH/TDT at 0x3810/0x3818, 0x100 per queue.
    pub const E1000: RingCsrLayout = RingCsrLayout {
        rx_head: 0x2810,
        rx_tail: 0x2818,
        tx_head: 0x3810,
        tx_tail: 0x3818,
        queue_stride: 0x100,
    };

    pub fn registers(&self, ring: RingId) -> Option<RingRegisters> {
        let offset = u32::from(ring.queue).checked_mul(self.queue_stride)?;
        let (head, tail) = match ring.direction {
            Direction::Rx => (self.rx_head, self.rx_tail),
            Direction::Tx => (self.tx_head, self.tx_tail),
        };
        Some(RingRegisters {
            head: head.checked_add(offset)?,
            tail: tail.checked_add(offset)?,
        })
    }
}

/// `(queue, direction) -> registers`, computed once from the device's queue counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingAddressTable {
    rings: BTreeMap<RingId, RingRegisters>,
}

impl RingAddressTable {
    pub fn build(layout: &RingCsrLayout, rx_queues: u16, tx_queues: u16) -> Self {
        let rx = (0..rx_queues).map(RingId::rx);
        let tx = (0..tx_queues).map(RingId::tx);
        let rings = rx
            .chain(tx)
            .filter_map(|ring| layout.registers(ring).map(|regs| (ring, regs)))
            .collect();
        Self { rings }
    }

    pub fn get(&self, ring: RingId) -> Option<RingRegisters> {
        self.rings.get(&ring).copied()
    }

    pub fn rx(&self, queue: QueueId) -> Option<RingRegisters> {
        self.get(RingId::rx(queue))
    }

    pub fn tx(&self, queue: QueueId) -> Option<RingRegisters> {
        self.get(RingId::tx(queue))
    }

    pub fn iter(&self) -> impl Iterator<Item = (RingId, RingRegisters)> + '_ {
        self.rings.iter().map(|(&ring, &regs)| (ring, regs))
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }
}
