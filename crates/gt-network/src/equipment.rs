//! Conducting equipment and the equipment kinds tracing distinguishes.

use gt_core::{
    EquipmentId, GridResult, NetworkState, SinglePhaseKind, TerminalId, Voltage,
};

/// Open-state mask covering every phase slot.
const ALL_PHASES_MASK: u8 = 0b1111;

/// Kinds of switching device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchKind {
    Breaker,
    Disconnector,
    Fuse,
    Jumper,
    LoadBreakSwitch,
    Recloser,
    /// A line-opening point placed along a conductor.
    Cut,
}

/// A switching device with independent NORMAL and CURRENT open masks.
///
/// Each mask holds one bit per phase slot so un-ganged devices can be open
/// on some phases only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    pub kind: SwitchKind,
    normal_open: u8,
    open: u8,
}

impl Switch {
    /// A closed switch.
    pub fn new(kind: SwitchKind) -> Self {
        Self {
            kind,
            normal_open: 0,
            open: 0,
        }
    }

    /// A switch open on all phases in both states.
    pub fn open(kind: SwitchKind) -> Self {
        Self {
            kind,
            normal_open: ALL_PHASES_MASK,
            open: ALL_PHASES_MASK,
        }
    }

    pub fn open_mask(&self, state: NetworkState) -> u8 {
        match state {
            NetworkState::Normal => self.normal_open,
            NetworkState::Current => self.open,
        }
    }

    /// Whether the switch is open on `phase`, or on any phase when `phase` is `None`.
    pub fn is_open(&self, state: NetworkState, phase: Option<SinglePhaseKind>) -> GridResult<bool> {
        let mask = self.open_mask(state);
        match phase {
            None => Ok(mask != 0),
            Some(phase) => {
                let bit = 1 << phase.require_mask_index()?;
                Ok(mask & bit != 0)
            }
        }
    }

    /// Open or close `phase`, or every phase when `phase` is `None`.
    pub fn set_open(
        &mut self,
        state: NetworkState,
        open: bool,
        phase: Option<SinglePhaseKind>,
    ) -> GridResult<()> {
        let bits = match phase {
            None => ALL_PHASES_MASK,
            Some(phase) => 1 << phase.require_mask_index()?,
        };
        let mask = match state {
            NetworkState::Normal => &mut self.normal_open,
            NetworkState::Current => &mut self.open,
        };
        if open {
            *mask |= bits;
        } else {
            *mask &= !bits;
        }
        Ok(())
    }
}

/// Role of a power transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformerFunctionKind {
    #[default]
    Other,
    PowerTransformer,
    DistributionTransformer,
    IsolationTransformer,
    VoltageRegulator,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PowerTransformer {
    pub function: TransformerFunctionKind,
    /// mRIDs of the substations housing this transformer.
    pub substations: Vec<String>,
}

impl PowerTransformer {
    pub fn new(function: TransformerFunctionKind) -> Self {
        Self {
            function,
            substations: Vec::new(),
        }
    }

    pub fn in_substation(mut self, substation: impl Into<String>) -> Self {
        self.substations.push(substation.into());
        self
    }
}

/// The finite set of equipment kinds tracing needs to tell apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquipmentKind {
    AcLineSegment,
    /// Zero-impedance multi-way connector, modelled with one terminal.
    BusbarSection,
    Junction,
    EnergySource,
    EnergyConsumer,
    /// Voltage regulators, inverters and other regulating devices.
    RegulatingDevice,
    Switch(Switch),
    PowerTransformer(PowerTransformer),
    Other,
}

/// A network device able to carry current.
#[derive(Debug, Clone)]
pub struct ConductingEquipment {
    pub(crate) id: EquipmentId,
    pub(crate) mrid: String,
    pub(crate) kind: EquipmentKind,
    /// Sorted by terminal sequence number.
    pub(crate) terminals: Vec<TerminalId>,
    pub in_service: bool,
    pub normally_in_service: bool,
    pub base_voltage: Option<Voltage>,
}

impl ConductingEquipment {
    pub(crate) fn new(id: EquipmentId, mrid: String, kind: EquipmentKind) -> Self {
        Self {
            id,
            mrid,
            kind,
            terminals: Vec::new(),
            in_service: true,
            normally_in_service: true,
            base_voltage: None,
        }
    }

    pub fn id(&self) -> EquipmentId {
        self.id
    }

    pub fn mrid(&self) -> &str {
        &self.mrid
    }

    pub fn kind(&self) -> &EquipmentKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut EquipmentKind {
        &mut self.kind
    }

    /// Terminal ids ordered by sequence number.
    pub fn terminals(&self) -> &[TerminalId] {
        &self.terminals
    }

    pub fn num_terminals(&self) -> usize {
        self.terminals.len()
    }

    pub fn in_service_for(&self, state: NetworkState) -> bool {
        match state {
            NetworkState::Normal => self.normally_in_service,
            NetworkState::Current => self.in_service,
        }
    }

    pub fn is_busbar(&self) -> bool {
        matches!(self.kind, EquipmentKind::BusbarSection)
    }

    pub fn as_switch(&self) -> Option<&Switch> {
        match &self.kind {
            EquipmentKind::Switch(switch) => Some(switch),
            _ => None,
        }
    }

    pub fn as_switch_mut(&mut self) -> Option<&mut Switch> {
        match &mut self.kind {
            EquipmentKind::Switch(switch) => Some(switch),
            _ => None,
        }
    }

    pub fn as_power_transformer(&self) -> Option<&PowerTransformer> {
        match &self.kind {
            EquipmentKind::PowerTransformer(tx) => Some(tx),
            _ => None,
        }
    }

    /// Open state of this equipment. Anything other than a switch is always closed.
    ///
    /// `phase` must not be `None`/`Invalid` when given, even for non-switches.
    pub fn is_open(&self, state: NetworkState, phase: Option<SinglePhaseKind>) -> GridResult<bool> {
        match &self.kind {
            EquipmentKind::Switch(switch) => switch.is_open(state, phase),
            _ => {
                if let Some(phase) = phase {
                    phase.require_mask_index()?;
                }
                Ok(false)
            }
        }
    }

    /// A power transformer housed in at least one substation.
    pub fn is_substation_transformer(&self) -> bool {
        self.as_power_transformer()
            .is_some_and(|tx| !tx.substations.is_empty())
    }
}
