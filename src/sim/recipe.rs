//! Micro-step recipes for each kind of activity.
//!
//! Every activity dispatched by the simulator expands into an ordered list of micro-steps
//! (switching to kernel mode, saving context, looking up the vector, ...).
//! Which steps occur, in what order, and how each step is timed is declared here as a [`Recipe`],
//! rather than being written out as control flow in the simulator.
//!
//! Recipes are grouped into a [`DispatchPolicy`]:
//! - [`DispatchPolicy::Flat`] (default): each part of the ISR is timed on its own.
//! - [`DispatchPolicy::Split`]: one ISR budget is drawn and split by percentage
//!   between PCB save, scheduler call, scheduler execution, and interrupt controller update.

use crate::ast::{ActivityKind, IntVect};

/// How a micro-step is timed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Timing {
    /// Always takes the given number of ms.
    Fixed(u64),
    /// Drawn uniformly from `lo..=hi` ms.
    Uniform {
        /// Shortest duration.
        lo: u64,
        /// Longest duration.
        hi: u64
    },
    /// Takes the duration requested by the activity.
    Requested,
    /// Takes the given percentage (floored) of the recipe's ISR budget.
    IsrShare(u8),
}

/// The category a micro-step's time is accounted under.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Category {
    /// Time spent executing user code.
    Cpu,
    /// Time spent servicing an I/O device.
    Io,
    /// Time spent on interrupt-handling overhead.
    Overhead,
}

/// Information about the vector an interrupt resolved to, used to label steps.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct VectorInfo {
    /// The interrupt number.
    pub vect: IntVect,
    /// The memory position of the vector in the table.
    pub offset: u32,
    /// The address of the ISR.
    pub isr: u16
}

/// One micro-step of handling an activity.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum MicroOp {
    /// The CPU runs user code.
    CpuExecution,
    /// Marker for the start of a system call.
    SyscallStart,
    /// The I/O device finishes its work.
    IoEnd,
    /// The interrupt's priority is checked.
    CheckPriority,
    /// The interrupt's mask bit is checked.
    CheckMasked,
    /// Switch from user to kernel mode.
    KernelMode,
    /// The CPU context is saved.
    ContextSave,
    /// The vector is located in the vector table.
    FindVector,
    /// The ISR address is loaded into the PC.
    LoadIsr,
    /// The system call's ISR runs.
    SyscallIsr,
    /// The ISR transfers data.
    TransferData,
    /// The ISR checks for errors.
    CheckErrors,
    /// The I/O completion's ISR runs.
    IoIsr,
    /// The ISR saves process information to the PCB.
    SavePcb,
    /// The ISR calls the scheduler.
    CallScheduler,
    /// The scheduler runs.
    ExecScheduler,
    /// The ISR updates the interrupt controller.
    UpdateController,
    /// Return from interrupt.
    Iret,
    /// The CPU context is restored.
    ContextRestore,
    /// Switch from kernel back to user mode.
    UserMode,
}
impl MicroOp {
    /// The category this step's time is accounted under.
    pub fn category(self) -> Category {
        match self {
            MicroOp::CpuExecution => Category::Cpu,
            MicroOp::IoEnd | MicroOp::IoIsr => Category::Io,
            _ => Category::Overhead,
        }
    }

    /// The human-readable label of this step.
    ///
    /// Steps that report vector information need `info`.
    /// Without it, they fall back to a label with no numbers.
    pub fn describe(self, info: Option<&VectorInfo>) -> String {
        match (self, info) {
            (MicroOp::CpuExecution, _)     => "CPU execution".into(),
            (MicroOp::SyscallStart, Some(i)) => format!("SYSCALL {} initiated", i.vect),
            (MicroOp::SyscallStart, None)  => "SYSCALL initiated".into(),
            (MicroOp::IoEnd, Some(i))      => format!("END_IO {}", i.vect),
            (MicroOp::IoEnd, None)         => "END_IO".into(),
            (MicroOp::CheckPriority, _)    => "check priority of interrupt".into(),
            (MicroOp::CheckMasked, _)      => "check if masked".into(),
            (MicroOp::KernelMode, _)       => "switch to kernel mode".into(),
            (MicroOp::ContextSave, _)      => "context saved".into(),
            (MicroOp::FindVector, Some(i)) => format!("find vector {} in memory position 0x{:04X}", i.vect, i.offset),
            (MicroOp::FindVector, None)    => "find vector in memory".into(),
            (MicroOp::LoadIsr, Some(i))    => format!("load address 0x{:04X} into the PC", i.isr),
            (MicroOp::LoadIsr, None)       => "obtain ISR address".into(),
            (MicroOp::SyscallIsr, _)       => "SYSCALL: run the ISR".into(),
            (MicroOp::TransferData, _)     => "transfer data".into(),
            (MicroOp::CheckErrors, _)      => "check for errors".into(),
            (MicroOp::IoIsr, Some(i))      => format!("END_IO {}: run the ISR", i.vect),
            (MicroOp::IoIsr, None)         => "END_IO: run the ISR".into(),
            (MicroOp::SavePcb, _)          => "save information to PCB".into(),
            (MicroOp::CallScheduler, _)    => "call the scheduler".into(),
            (MicroOp::ExecScheduler, _)    => "execute the scheduler".into(),
            (MicroOp::UpdateController, _) => "update interrupt controller status".into(),
            (MicroOp::Iret, _)             => "IRET".into(),
            (MicroOp::ContextRestore, _)   => "context restored".into(),
            (MicroOp::UserMode, _)         => "switch to user mode".into(),
        }
    }
}

/// A micro-step and how it is timed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Step {
    /// The micro-step.
    pub op: MicroOp,
    /// How long the micro-step takes.
    pub timing: Timing
}
const fn step(op: MicroOp, timing: Timing) -> Step {
    Step { op, timing }
}

/// The ordered list of micro-steps an activity expands into.
#[derive(Debug, PartialEq, Eq)]
pub struct Recipe {
    /// The steps, in order.
    pub steps: &'static [Step],
    /// The range the ISR budget is drawn from (for steps timed with [`Timing::IsrShare`]).
    ///
    /// The budget is drawn once per activity, when the first such step is reached.
    pub isr_budget: Option<(u64, u64)>
}

/// Fixed duration of single-cycle steps.
const TICK: Timing = Timing::Fixed(1);
/// Duration of saving or restoring context.
pub const CONTEXT_SWITCH: Timing = Timing::Uniform { lo: 1, hi: 3 };
/// Duration of a system call's ISR (flat policy).
pub const SYSCALL_ISR: Timing = Timing::Uniform { lo: 100, hi: 400 };
/// Duration of transferring data or checking for errors (flat policy).
pub const ISR_TAIL: Timing = Timing::Uniform { lo: 50, hi: 149 };
/// The range of the ISR budget (split policy).
pub const ISR_BUDGET: (u64, u64) = (100, 400);

static CPU: Recipe = Recipe {
    steps: &[step(MicroOp::CpuExecution, Timing::Requested)],
    isr_budget: None
};

static FLAT_SYSCALL: Recipe = Recipe {
    steps: &[
        step(MicroOp::KernelMode,   TICK),
        step(MicroOp::ContextSave,  CONTEXT_SWITCH),
        step(MicroOp::FindVector,   TICK),
        step(MicroOp::LoadIsr,      TICK),
        step(MicroOp::SyscallIsr,   SYSCALL_ISR),
        step(MicroOp::TransferData, ISR_TAIL),
        step(MicroOp::CheckErrors,  ISR_TAIL),
        step(MicroOp::Iret,         TICK),
    ],
    isr_budget: None
};
static FLAT_END_IO: Recipe = Recipe {
    steps: &[
        step(MicroOp::CheckPriority, TICK),
        step(MicroOp::CheckMasked,   TICK),
        step(MicroOp::KernelMode,    TICK),
        step(MicroOp::ContextSave,   CONTEXT_SWITCH),
        step(MicroOp::FindVector,    TICK),
        step(MicroOp::LoadIsr,       TICK),
        step(MicroOp::IoIsr,         Timing::Requested),
        step(MicroOp::Iret,          TICK),
    ],
    isr_budget: None
};

// Shared by both split recipes, after their leading marker.
macro_rules! split_body {
    ($($lead:expr),*) => {
        &[
            $($lead,)*
            step(MicroOp::KernelMode,       TICK),
            step(MicroOp::ContextSave,      CONTEXT_SWITCH),
            step(MicroOp::FindVector,       TICK),
            step(MicroOp::LoadIsr,          TICK),
            step(MicroOp::SavePcb,          Timing::IsrShare(25)),
            step(MicroOp::CallScheduler,    Timing::IsrShare(15)),
            step(MicroOp::ExecScheduler,    Timing::IsrShare(40)),
            step(MicroOp::UpdateController, Timing::IsrShare(20)),
            step(MicroOp::Iret,             TICK),
            step(MicroOp::ContextRestore,   CONTEXT_SWITCH),
            step(MicroOp::UserMode,         TICK),
        ]
    }
}
static SPLIT_SYSCALL: Recipe = Recipe {
    steps: split_body!(step(MicroOp::SyscallStart, Timing::Fixed(0))),
    isr_budget: Some(ISR_BUDGET)
};
static SPLIT_END_IO: Recipe = Recipe {
    steps: split_body!(step(MicroOp::IoEnd, Timing::Requested)),
    isr_budget: Some(ISR_BUDGET)
};

/// The set of recipes used to dispatch activities.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub enum DispatchPolicy {
    /// Each part of the ISR is timed independently.
    ///
    /// A system call runs its ISR, transfers data, and checks for errors,
    /// while an I/O completion checks priority and masking before it is handled
    /// and then services the device for its requested duration.
    #[default]
    Flat,

    /// One ISR budget is drawn per interrupt and split by percentage between
    /// saving to the PCB (25%), calling the scheduler (15%),
    /// executing the scheduler (40%), and updating the interrupt controller (20%).
    ///
    /// Handling also restores context and returns to user mode after `IRET`.
    Split,
}
impl DispatchPolicy {
    /// The recipe used for the given kind of activity.
    pub fn recipe(self, kind: ActivityKind) -> &'static Recipe {
        match (self, kind) {
            (_, ActivityKind::CpuBurst) => &CPU,
            (DispatchPolicy::Flat,  ActivityKind::SystemCall)   => &FLAT_SYSCALL,
            (DispatchPolicy::Flat,  ActivityKind::IoCompletion) => &FLAT_END_IO,
            (DispatchPolicy::Split, ActivityKind::SystemCall)   => &SPLIT_SYSCALL,
            (DispatchPolicy::Split, ActivityKind::IoCompletion) => &SPLIT_END_IO,
        }
    }

    /// The name of this policy.
    pub fn name(self) -> &'static str {
        match self {
            DispatchPolicy::Flat  => "flat",
            DispatchPolicy::Split => "split",
        }
    }
}
impl std::fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
impl std::str::FromStr for DispatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.to_lowercase() {
            "flat"  => Ok(DispatchPolicy::Flat),
            "split" => Ok(DispatchPolicy::Split),
            _ => Err(format!("unknown dispatch policy {s:?} (expected flat or split)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::ActivityKind;

    use super::{DispatchPolicy, MicroOp, Timing, VectorInfo};

    fn ops(policy: DispatchPolicy, kind: ActivityKind) -> Vec<MicroOp> {
        policy.recipe(kind).steps.iter().map(|s| s.op).collect()
    }

    #[test]
    fn test_end_io_prefix() {
        for policy in [DispatchPolicy::Flat, DispatchPolicy::Split] {
            let sc = ops(policy, ActivityKind::SystemCall);
            let io = ops(policy, ActivityKind::IoCompletion);
            assert_eq!(sc.last(), io.last());
            assert!(sc.contains(&MicroOp::Iret));
        }

        let sc = ops(DispatchPolicy::Flat, ActivityKind::SystemCall);
        let io = ops(DispatchPolicy::Flat, ActivityKind::IoCompletion);
        assert_eq!(&io[..2], [MicroOp::CheckPriority, MicroOp::CheckMasked]);
        assert_eq!(io[2..6], sc[..4]);
    }

    #[test]
    fn test_split_shares_sum() {
        for kind in [ActivityKind::SystemCall, ActivityKind::IoCompletion] {
            let recipe = DispatchPolicy::Split.recipe(kind);
            assert!(recipe.isr_budget.is_some());

            let total: u32 = recipe.steps.iter()
                .filter_map(|s| match s.timing {
                    Timing::IsrShare(p) => Some(u32::from(p)),
                    _ => None
                })
                .sum();
            assert_eq!(total, 100);
        }
    }

    #[test]
    fn test_describe() {
        let info = VectorInfo { vect: 1, offset: 0, isr: 0x01A3 };
        assert_eq!(MicroOp::FindVector.describe(Some(&info)), "find vector 1 in memory position 0x0000");
        assert_eq!(MicroOp::LoadIsr.describe(Some(&info)), "load address 0x01A3 into the PC");
        assert_eq!(MicroOp::IoIsr.describe(Some(&info)), "END_IO 1: run the ISR");
        assert_eq!(MicroOp::SyscallIsr.describe(Some(&info)), "SYSCALL: run the ISR");
        assert_eq!(MicroOp::CpuExecution.describe(None), "CPU execution");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("flat".parse(), Ok(DispatchPolicy::Flat));
        assert_eq!("SPLIT".parse(), Ok(DispatchPolicy::Split));
        assert!("other".parse::<DispatchPolicy>().is_err());
    }
}
