// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operation names as advertised by the host.

pub const LAUNCH_TARGET_APP: &str = "launch_target_app";
pub const CLOSE_TARGET_APP: &str = "close_target_app";
pub const GET_WINDOW_INFO: &str = "get_window_info";
pub const FOCUS_TARGET_WINDOW: &str = "focus_target_window";
pub const GET_SCREEN_FRAME: &str = "get_screen_frame";
pub const RUN_STRESS_TEST: &str = "run_stress_test";
pub const EXECUTE_AI_COMMAND: &str = "execute_ai_command";
pub const VERIFY_VISUAL_RESULT: &str = "verify_visual_result";
pub const SET_AI_API_KEY: &str = "set_ai_api_key";
pub const RUN_STATIC_ANALYSIS: &str = "run_static_analysis";
pub const SCAN_UNIT_TESTS: &str = "scan_unit_tests";
pub const RUN_UNIT_TEST: &str = "run_unit_test";
pub const GET_CODE_METRICS: &str = "get_code_metrics";
pub const PING: &str = "ping";
pub const GET_VERSION: &str = "get_version";

/// Every operation a full host exposes.
pub const ALL: &[&str] = &[
	LAUNCH_TARGET_APP,
	CLOSE_TARGET_APP,
	GET_WINDOW_INFO,
	FOCUS_TARGET_WINDOW,
	GET_SCREEN_FRAME,
	RUN_STRESS_TEST,
	EXECUTE_AI_COMMAND,
	VERIFY_VISUAL_RESULT,
	SET_AI_API_KEY,
	RUN_STATIC_ANALYSIS,
	SCAN_UNIT_TESTS,
	RUN_UNIT_TEST,
	GET_CODE_METRICS,
	PING,
	GET_VERSION,
];
