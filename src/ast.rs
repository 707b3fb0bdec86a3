//! Components relating to the activities that make up a trace.
//!
//! The key type here is [`Activity`], one unit of workload consumed by the simulator.
//! A trace is simply an ordered list of these activities.
//!
//! Activities are typically created by the parser ([`crate::parse::parse_trace`]),
//! but they can also be constructed directly or with [`Activity::new`],
//! which validates the parts of an activity the same way the parser does.

/// An interrupt (or system call) number.
///
/// Interrupt numbers are 1-based and index into the vector table.
pub type IntVect = u16;

/// The kind of an [`Activity`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ActivityKind {
    /// Pure CPU execution (`CPU`).
    CpuBurst,
    /// A system call (`SYSCALL`).
    SystemCall,
    /// An I/O completion interrupt (`END_IO`).
    IoCompletion,
}
impl ActivityKind {
    /// The keyword used for this kind in a trace.
    pub fn keyword(self) -> &'static str {
        match self {
            ActivityKind::CpuBurst     => "CPU",
            ActivityKind::SystemCall   => "SYSCALL",
            ActivityKind::IoCompletion => "END_IO",
        }
    }

    /// Whether activities of this kind reference an interrupt vector.
    pub fn has_vect(self) -> bool {
        !matches!(self, ActivityKind::CpuBurst)
    }
}
impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}
impl std::str::FromStr for ActivityKind {
    type Err = ActivityErr;

    /// Parses a trace keyword (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.to_uppercase() {
            "CPU"     => Ok(ActivityKind::CpuBurst),
            "SYSCALL" => Ok(ActivityKind::SystemCall),
            "END_IO"  => Ok(ActivityKind::IoCompletion),
            _ => Err(ActivityErr::UnknownKind(s.to_string())),
        }
    }
}

/// Reasons an activity record could not be formed.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum ActivityErr {
    /// The activity keyword is not one of `CPU`, `SYSCALL`, `END_IO`.
    #[error("unknown activity kind {0:?}")]
    UnknownKind(String),
    /// A `SYSCALL` or `END_IO` was missing its interrupt number.
    #[error("{0} activity is missing an interrupt number")]
    MissingVect(ActivityKind),
    /// A `CPU` activity had an interrupt number.
    #[error("{0} activity does not take an interrupt number")]
    UnexpectedVect(ActivityKind),
    /// Interrupt number 0 was referenced.
    #[error("interrupt number 0 is not valid")]
    ZeroVect,
}
impl crate::err::Error for ActivityErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            ActivityErr::UnknownKind(_)    => Some("an activity must be one of CPU, SYSCALL, or END_IO".into()),
            ActivityErr::MissingVect(k)    => Some(format!("write this as `{k} <number>, <duration>`").into()),
            ActivityErr::UnexpectedVect(k) => Some(format!("write this as `{k}, <duration>`").into()),
            ActivityErr::ZeroVect          => Some("interrupt numbers start at 1".into()),
        }
    }
}

/// One unit of workload in a trace.
///
/// The meaning of `duration` depends on the kind:
/// - for [`Activity::CpuBurst`], it is the time the CPU is busy,
/// - for [`Activity::SystemCall`] and [`Activity::IoCompletion`], it is the
///   nominal requested duration, which each dispatch policy consumes differently.
///
/// ## Examples
///
/// ```text
/// CPU, 10
/// ~~~~~~~ CpuBurst { duration: 10 }
/// SYSCALL 7, 120
/// ~~~~~~~~~~~~~~ SystemCall { vect: 7, duration: 120 }
/// END_IO 20, 300
/// ~~~~~~~~~~~~~~ IoCompletion { vect: 20, duration: 300 }
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Activity {
    /// The CPU executes user code for `duration` ms.
    CpuBurst {
        /// Busy time in ms.
        duration: u64
    },
    /// A system call through vector `vect`.
    SystemCall {
        /// The system call number.
        vect: IntVect,
        /// Requested duration in ms.
        duration: u64
    },
    /// An I/O device signalling completion through vector `vect`.
    IoCompletion {
        /// The interrupt number.
        vect: IntVect,
        /// Requested duration in ms.
        duration: u64
    },
}
impl Activity {
    /// Creates an activity out of its parts, validating that they form a recognized record.
    ///
    /// ```
    /// use irqsim::ast::{Activity, ActivityKind, ActivityErr};
    ///
    /// assert_eq!(
    ///     Activity::new(ActivityKind::SystemCall, Some(7), 120),
    ///     Ok(Activity::SystemCall { vect: 7, duration: 120 })
    /// );
    /// assert_eq!(
    ///     Activity::new(ActivityKind::CpuBurst, Some(7), 120),
    ///     Err(ActivityErr::UnexpectedVect(ActivityKind::CpuBurst))
    /// );
    /// ```
    pub fn new(kind: ActivityKind, vect: Option<IntVect>, duration: u64) -> Result<Self, ActivityErr> {
        match (kind, vect) {
            (ActivityKind::CpuBurst, None) => Ok(Activity::CpuBurst { duration }),
            (ActivityKind::CpuBurst, Some(_)) => Err(ActivityErr::UnexpectedVect(kind)),
            (_, None) => Err(ActivityErr::MissingVect(kind)),
            (_, Some(0)) => Err(ActivityErr::ZeroVect),
            (ActivityKind::SystemCall, Some(vect)) => Ok(Activity::SystemCall { vect, duration }),
            (ActivityKind::IoCompletion, Some(vect)) => Ok(Activity::IoCompletion { vect, duration }),
        }
    }

    /// The kind of this activity.
    pub fn kind(&self) -> ActivityKind {
        match self {
            Activity::CpuBurst { .. }     => ActivityKind::CpuBurst,
            Activity::SystemCall { .. }   => ActivityKind::SystemCall,
            Activity::IoCompletion { .. } => ActivityKind::IoCompletion,
        }
    }

    /// The interrupt number of this activity (if it has one).
    pub fn vect(&self) -> Option<IntVect> {
        match *self {
            Activity::CpuBurst { .. } => None,
            Activity::SystemCall { vect, .. } | Activity::IoCompletion { vect, .. } => Some(vect),
        }
    }

    /// The duration attached to this activity.
    pub fn duration(&self) -> u64 {
        match *self {
            Activity::CpuBurst { duration }
            | Activity::SystemCall { duration, .. }
            | Activity::IoCompletion { duration, .. } => duration,
        }
    }
}
impl std::fmt::Display for Activity {
    /// Writes the activity in trace format.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.vect() {
            Some(v) => write!(f, "{} {v}, {}", self.kind(), self.duration()),
            None    => write!(f, "{}, {}", self.kind(), self.duration()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Activity, ActivityErr, ActivityKind};

    #[test]
    fn test_kind_from_str() {
        assert_eq!("CPU".parse(), Ok(ActivityKind::CpuBurst));
        assert_eq!("syscall".parse(), Ok(ActivityKind::SystemCall));
        assert_eq!("End_Io".parse(), Ok(ActivityKind::IoCompletion));
        assert_eq!("FORK".parse::<ActivityKind>(), Err(ActivityErr::UnknownKind("FORK".to_string())));
    }

    #[test]
    fn test_new_validation() {
        assert_eq!(Activity::new(ActivityKind::CpuBurst, None, 10), Ok(Activity::CpuBurst { duration: 10 }));
        assert_eq!(Activity::new(ActivityKind::IoCompletion, Some(20), 0), Ok(Activity::IoCompletion { vect: 20, duration: 0 }));
        assert_eq!(Activity::new(ActivityKind::SystemCall, None, 10), Err(ActivityErr::MissingVect(ActivityKind::SystemCall)));
        assert_eq!(Activity::new(ActivityKind::IoCompletion, Some(0), 10), Err(ActivityErr::ZeroVect));
    }

    #[test]
    fn test_display() {
        assert_eq!(Activity::CpuBurst { duration: 10 }.to_string(), "CPU, 10");
        assert_eq!(Activity::SystemCall { vect: 7, duration: 120 }.to_string(), "SYSCALL 7, 120");
        assert_eq!(Activity::IoCompletion { vect: 20, duration: 3 }.to_string(), "END_IO 20, 3");
    }
}
