// Adapters layer: concrete implementations of the domain ports.

pub mod haptics;
pub mod supabase;

pub use haptics::NoopHaptics;
pub use supabase::SupabaseClient;
