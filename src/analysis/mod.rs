pub mod fragmentation;
