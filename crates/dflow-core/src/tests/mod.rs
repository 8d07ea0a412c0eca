/*! Behavioural tests for block formation, CFG construction and the dataflow analyses.
 *
 * Fixtures are written as Bril JSON so they read like the programs the CLI consumes.
 */

mod analysis_tests;
mod control_flow_tests;
mod engine_tests;
