pub mod compile_time {
    pub mod criteria {
        /// Maximum entries accepted in a single type set
        /// SECURITY: Bounds the cost of every subset check during composition
        pub const MAX_TYPE_SET_ENTRIES: usize = 64;

        /// Maximum literals in an includes or excludes list
        /// RESOURCE: Membership checks are linear in this size
        pub const MAX_MEMBERSHIP_LITERALS: usize = 1024;

        /// Maximum nesting of contracts inside type sets (higher-order callables)
        /// SECURITY: Prevents stack exhaustion while comparing nested contracts
        pub const MAX_NESTED_CONTRACT_DEPTH: usize = 16;

        /// Maximum depth followed when structurally matching object literals
        pub const MAX_STRUCTURAL_MATCH_DEPTH: usize = 32;
    }

    pub mod registry {
        /// Maximum number of ancestors walked before a chain is rejected
        /// SECURITY: Bounds every ancestry walk even without terminators
        pub const MAX_ANCESTRY_DEPTH: usize = 256;

        /// Maximum providers folded into one registry
        pub const MAX_PROVIDERS_PER_REGISTRY: usize = 512;

        /// Maximum global chain terminators
        pub const MAX_CHAIN_TERMINATORS: usize = 1024;
    }

    pub mod diagnostics {
        /// Maximum violations retained in one aggregate or report
        /// RESOURCE: Excess violations are dropped and the aggregate is flagged truncated
        pub const MAX_VIOLATIONS_PER_REPORT: usize = 1000;

        /// Maximum length of a violation message
        pub const MAX_ERROR_MESSAGE_LENGTH: usize = 1024;

        /// Maximum length of a member name echoed into diagnostics
        pub const MAX_MEMBER_NAME_LENGTH: usize = 255;
    }

    pub mod logging {
        /// Maximum events retained by in-memory loggers
        pub const LOG_BUFFER_SIZE: usize = 10_000;

        /// Maximum log message length
        pub const MAX_LOG_MESSAGE_LENGTH: usize = 4096;

        /// Lowest level security-relevant events may be filtered to (1 = warning)
        pub const SECURITY_MIN_LOG_LEVEL: u8 = 1;
    }
}
