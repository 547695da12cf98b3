mod action_tests;
mod property_tests;
