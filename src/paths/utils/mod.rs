pub mod deserialization_helpers;
