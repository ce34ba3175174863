use std::f64::consts::{PI, SQRT_2};

use super::ast::LslType;
use super::flags::AcceptedFlags;
use super::value::{ConstantValue, Rotation, Vector};

/// Words that can never be used as identifiers.
pub static RESERVED_WORDS: &[&str] = &[
    "integer", "float", "string", "key", "vector", "rotation", "quaternion", "list", "void",
    "if", "else", "for", "while", "do", "return", "state", "default", "jump", "print",
];

/// Keywords that may not appear inside a control-flow header.
pub static CONTROL_KEYWORDS: &[&str] = &["if", "else", "for", "while", "do", "return", "state", "jump"];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

pub fn is_control_keyword(name: &str) -> bool {
    CONTROL_KEYWORDS.contains(&name)
}

// ── Events ───────────────────────────────────────────────────────

/// Fixed event table: handlers must match name, arity, and parameter types.
#[derive(Debug, Clone)]
pub struct EventSignature {
    pub name: &'static str,
    pub params: &'static [LslType],
}

macro_rules! event {
    ($name:literal $(, $ty:ident)*) => {
        EventSignature { name: $name, params: &[$(LslType::$ty),*] }
    };
}

pub static EVENTS: &[EventSignature] = &[
    event!("at_rot_target", Integer, Rotation, Rotation),
    event!("at_target", Integer, Vector, Vector),
    event!("attach", Key),
    event!("changed", Integer),
    event!("collision", Integer),
    event!("collision_end", Integer),
    event!("collision_start", Integer),
    event!("control", Key, Integer, Integer),
    event!("dataserver", Key, String),
    event!("email", String, String, String, String, Integer),
    event!("experience_permissions", Key),
    event!("experience_permissions_denied", Key, Integer),
    event!("http_request", Key, String, String),
    event!("http_response", Key, Integer, List, String),
    event!("land_collision", Vector),
    event!("land_collision_end", Vector),
    event!("land_collision_start", Vector),
    event!("link_message", Integer, Integer, String, Key),
    event!("listen", Integer, String, Key, String),
    event!("money", Key, Integer),
    event!("moving_end"),
    event!("moving_start"),
    event!("no_sensor"),
    event!("not_at_rot_target"),
    event!("not_at_target"),
    event!("object_rez", Key),
    event!("on_rez", Integer),
    event!("path_update", Integer, List),
    event!("remote_data", Integer, Key, Key, String, Integer, String),
    event!("run_time_permissions", Integer),
    event!("sensor", Integer),
    event!("state_entry"),
    event!("state_exit"),
    event!("timer"),
    event!("touch", Integer),
    event!("touch_end", Integer),
    event!("touch_start", Integer),
    event!("transaction_result", Key, Integer, String),
];

pub fn find_event(name: &str) -> Option<&'static EventSignature> {
    EVENTS.iter().find(|e| e.name == name)
}

// ── Constants ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum BuiltinValue {
    Int(i32),
    Float(f64),
    Str(&'static str),
    Vector(f64, f64, f64),
    Rotation(f64, f64, f64, f64),
}

impl BuiltinValue {
    pub fn to_constant(self) -> ConstantValue {
        match self {
            BuiltinValue::Int(i) => ConstantValue::Integer(i),
            BuiltinValue::Float(f) => ConstantValue::Float(f),
            BuiltinValue::Str(s) => ConstantValue::String(s.to_owned()),
            BuiltinValue::Vector(x, y, z) => ConstantValue::Vector(Vector::new(x, y, z)),
            BuiltinValue::Rotation(x, y, z, s) => ConstantValue::Rotation(Rotation::new(x, y, z, s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuiltinConstant {
    pub name: &'static str,
    pub value: BuiltinValue,
    pub flag: AcceptedFlags,
}

macro_rules! constant {
    ($flag:ident, $name:literal, int $v:expr) => {
        BuiltinConstant { name: $name, value: BuiltinValue::Int($v), flag: AcceptedFlags::$flag }
    };
    ($flag:ident, $name:literal, float $v:expr) => {
        BuiltinConstant { name: $name, value: BuiltinValue::Float($v), flag: AcceptedFlags::$flag }
    };
    ($flag:ident, $name:literal, str $v:expr) => {
        BuiltinConstant { name: $name, value: BuiltinValue::Str($v), flag: AcceptedFlags::$flag }
    };
}

pub static CONSTANTS: &[BuiltinConstant] = &[
    // ── Core ────────────────────────────────────────────────────
    constant!(LSL, "TRUE", int 1),
    constant!(LSL, "FALSE", int 0),
    constant!(LSL, "PI", float PI),
    constant!(LSL, "TWO_PI", float PI * 2.0),
    constant!(LSL, "PI_BY_TWO", float PI / 2.0),
    constant!(LSL, "DEG_TO_RAD", float PI / 180.0),
    constant!(LSL, "RAD_TO_DEG", float 180.0 / PI),
    constant!(LSL, "SQRT2", float SQRT_2),
    BuiltinConstant { name: "ZERO_VECTOR", value: BuiltinValue::Vector(0.0, 0.0, 0.0), flag: AcceptedFlags::LSL },
    BuiltinConstant {
        name: "ZERO_ROTATION",
        value: BuiltinValue::Rotation(0.0, 0.0, 0.0, 1.0),
        flag: AcceptedFlags::LSL,
    },
    constant!(LSL, "NULL_KEY", str "00000000-0000-0000-0000-000000000000"),
    constant!(LSL, "EOF", str "\n\n\n"),
    constant!(LSL, "PUBLIC_CHANNEL", int 0),
    constant!(LSL, "DEBUG_CHANNEL", int 2_147_483_647),
    constant!(LSL, "ALL_SIDES", int -1),
    // ── Sensors ─────────────────────────────────────────────────
    constant!(LSL, "AGENT", int 1),
    constant!(LSL, "ACTIVE", int 2),
    constant!(LSL, "PASSIVE", int 4),
    constant!(LSL, "SCRIPTED", int 8),
    // ── Change flags ────────────────────────────────────────────
    constant!(LSL, "CHANGED_INVENTORY", int 1),
    constant!(LSL, "CHANGED_COLOR", int 2),
    constant!(LSL, "CHANGED_SHAPE", int 4),
    constant!(LSL, "CHANGED_SCALE", int 8),
    constant!(LSL, "CHANGED_TEXTURE", int 16),
    constant!(LSL, "CHANGED_LINK", int 32),
    constant!(LSL, "CHANGED_ALLOWED_DROP", int 64),
    constant!(LSL, "CHANGED_OWNER", int 128),
    constant!(LSL, "CHANGED_REGION", int 256),
    constant!(LSL, "CHANGED_TELEPORT", int 512),
    constant!(LSL, "CHANGED_REGION_START", int 1024),
    // ── Permissions ─────────────────────────────────────────────
    constant!(LSL, "PERMISSION_DEBIT", int 2),
    constant!(LSL, "PERMISSION_TAKE_CONTROLS", int 4),
    constant!(LSL, "PERMISSION_TRIGGER_ANIMATION", int 16),
    constant!(LSL, "PERMISSION_ATTACH", int 32),
    constant!(LSL, "PERMISSION_CHANGE_LINKS", int 128),
    constant!(LSL, "PERMISSION_TRACK_CAMERA", int 1024),
    constant!(LSL, "PERMISSION_CONTROL_CAMERA", int 2048),
    // ── Links ───────────────────────────────────────────────────
    constant!(LSL, "LINK_ROOT", int 1),
    constant!(LSL, "LINK_SET", int -1),
    constant!(LSL, "LINK_ALL_OTHERS", int -2),
    constant!(LSL, "LINK_ALL_CHILDREN", int -3),
    constant!(LSL, "LINK_THIS", int -4),
    // ── Object status and types ─────────────────────────────────
    constant!(LSL, "STATUS_PHYSICS", int 1),
    constant!(LSL, "STATUS_ROTATE_X", int 2),
    constant!(LSL, "STATUS_ROTATE_Y", int 4),
    constant!(LSL, "STATUS_ROTATE_Z", int 8),
    constant!(LSL, "STATUS_PHANTOM", int 16),
    constant!(LSL, "TYPE_INVALID", int 0),
    constant!(LSL, "TYPE_INTEGER", int 1),
    constant!(LSL, "TYPE_FLOAT", int 2),
    constant!(LSL, "TYPE_STRING", int 3),
    constant!(LSL, "TYPE_KEY", int 4),
    constant!(LSL, "TYPE_VECTOR", int 5),
    constant!(LSL, "TYPE_ROTATION", int 6),
    constant!(LSL, "INVENTORY_ALL", int -1),
    constant!(LSL, "INVENTORY_NONE", int -1),
    constant!(LSL, "INVENTORY_TEXTURE", int 0),
    constant!(LSL, "INVENTORY_SOUND", int 1),
    constant!(LSL, "INVENTORY_OBJECT", int 6),
    constant!(LSL, "INVENTORY_NOTECARD", int 7),
    constant!(LSL, "INVENTORY_SCRIPT", int 10),
    constant!(LSL, "INVENTORY_ANIMATION", int 20),
    // ── Controls ────────────────────────────────────────────────
    constant!(LSL, "CONTROL_FWD", int 1),
    constant!(LSL, "CONTROL_BACK", int 2),
    constant!(LSL, "CONTROL_LEFT", int 4),
    constant!(LSL, "CONTROL_RIGHT", int 8),
    constant!(LSL, "CONTROL_UP", int 16),
    constant!(LSL, "CONTROL_DOWN", int 32),
    constant!(LSL, "CONTROL_LBUTTON", int 0x1000_0000),
    constant!(LSL, "CONTROL_ML_LBUTTON", int 0x4000_0000),
    // ── Prim parameters ─────────────────────────────────────────
    constant!(LSL, "PRIM_MATERIAL", int 2),
    constant!(LSL, "PRIM_PHYSICS", int 3),
    constant!(LSL, "PRIM_TEMP_ON_REZ", int 4),
    constant!(LSL, "PRIM_PHANTOM", int 5),
    constant!(LSL, "PRIM_POSITION", int 6),
    constant!(LSL, "PRIM_SIZE", int 7),
    constant!(LSL, "PRIM_ROTATION", int 8),
    constant!(LSL, "PRIM_TYPE", int 9),
    constant!(LSL, "PRIM_TEXTURE", int 17),
    constant!(LSL, "PRIM_COLOR", int 18),
    constant!(LSL, "PRIM_FULLBRIGHT", int 20),
    constant!(LSL, "PRIM_GLOW", int 25),
    constant!(LSL, "PRIM_TEXT", int 26),
    constant!(LSL, "PRIM_NAME", int 27),
    constant!(LSL, "PRIM_DESC", int 28),
    constant!(LSL, "OBJECT_NAME", int 1),
    constant!(LSL, "OBJECT_DESC", int 2),
    constant!(LSL, "OBJECT_POS", int 3),
    constant!(LSL, "OBJECT_ROT", int 4),
    constant!(LSL, "OBJECT_VELOCITY", int 5),
    constant!(LSL, "OBJECT_OWNER", int 6),
    constant!(LSL, "OBJECT_GROUP", int 7),
    constant!(LSL, "OBJECT_CREATOR", int 8),
    constant!(LSL, "ATTACH_CHEST", int 1),
    constant!(LSL, "ATTACH_HEAD", int 2),
    constant!(LSL, "ATTACH_LHAND", int 5),
    constant!(LSL, "ATTACH_RHAND", int 6),
    // ── Strings, HTTP, JSON ─────────────────────────────────────
    constant!(LSL, "STRING_TRIM_HEAD", int 1),
    constant!(LSL, "STRING_TRIM_TAIL", int 2),
    constant!(LSL, "STRING_TRIM", int 3),
    constant!(LSL, "HTTP_METHOD", int 0),
    constant!(LSL, "HTTP_MIMETYPE", int 1),
    constant!(LSL, "HTTP_BODY_MAXLENGTH", int 2),
    constant!(LSL, "HTTP_VERIFY_CERT", int 3),
    constant!(LSL, "JSON_INVALID", str "\u{FDD0}"),
    constant!(LSL, "JSON_OBJECT", str "\u{FDD1}"),
    constant!(LSL, "JSON_ARRAY", str "\u{FDD2}"),
    constant!(LSL, "JSON_NUMBER", str "\u{FDD3}"),
    constant!(LSL, "JSON_STRING", str "\u{FDD4}"),
    constant!(LSL, "JSON_NULL", str "\u{FDD5}"),
    constant!(LSL, "JSON_TRUE", str "\u{FDD6}"),
    constant!(LSL, "JSON_FALSE", str "\u{FDD7}"),
    // ── Vehicles ────────────────────────────────────────────────
    constant!(LSL, "VEHICLE_TYPE_NONE", int 0),
    constant!(LSL, "VEHICLE_TYPE_SLED", int 1),
    constant!(LSL, "VEHICLE_TYPE_CAR", int 2),
    constant!(LSL, "VEHICLE_TYPE_BOAT", int 3),
    constant!(LSL, "VEHICLE_TYPE_AIRPLANE", int 4),
    constant!(LSL, "VEHICLE_TYPE_BALLOON", int 5),
    // ── OpenSimulator ───────────────────────────────────────────
    constant!(OSSL, "OS_NPC_FLY", int 0),
    constant!(OSSL, "OS_NPC_NO_FLY", int 1),
    constant!(OSSL, "OS_NPC_LAND_AT_TARGET", int 2),
    constant!(OSSL, "OS_NPC_SIT_NOW", int 0),
    constant!(OSSL, "OS_NPC_CREATOR_OWNED", int 1),
    constant!(OSSL, "OS_NPC_NOT_OWNED", int 2),
    constant!(OSSL, "OS_NPC_SENSE_AS_AGENT", int 4),
    constant!(OSSL, "STATS_TIME_DILATION", int 0),
    constant!(OSSL, "STATS_SIM_FPS", int 1),
    constant!(OSSL, "STATS_PHYSICS_FPS", int 2),
    constant!(OSSL, "STATS_AGENT_UPDATES", int 3),
    constant!(OSSL, "STATS_ROOT_AGENTS", int 4),
    constant!(OSSL, "STATS_CHILD_AGENTS", int 5),
    constant!(OSSL, "STATS_TOTAL_PRIMS", int 6),
    constant!(OSSL, "STATS_ACTIVE_PRIMS", int 7),
    constant!(OSSL, "STATS_ACTIVE_SCRIPTS", int 19),
    constant!(OSSL, "WL_WATER_COLOR", int 0),
    constant!(OSSL, "WL_WATER_FOG_DENSITY_EXPONENT", int 1),
    constant!(OSSL, "WL_UNDERWATER_FOG_MODIFIER", int 2),
    // ── Aurora ──────────────────────────────────────────────────
    constant!(AURORA, "BOT_FOLLOW_FLY", int 0),
    constant!(AURORA, "BOT_FOLLOW_WALK", int 1),
    constant!(AURORA, "BOT_FOLLOW_RUN", int 2),
    constant!(AURORA, "BOT_FOLLOW_TELEPORT", int 3),
    constant!(AURORA, "BOT_FOLLOW_WAIT", int 4),
    constant!(AURORA, "BOT_FOLLOW_TRIGGER_HERE_EVENT", int 1),
    constant!(AURORA, "BOT_FOLLOW_FLAG_NONE", int 0),
    constant!(AURORA, "BOT_FOLLOW_FLAG_INDEFINITELY", int 1),
    constant!(AURORA, "BOT_TAG_FIND_ALL", str "AllBots"),
    constant!(AURORA, "BOT_WANDER_MOVEMENT_TYPE", int 1),
    constant!(AURORA, "BOT_WANDER_TIME_BETWEEN_NODES", int 2),
    constant!(AURORA, "ENABLE_GRAVITY", int 0),
    constant!(AURORA, "GRAVITY_FORCE_X", int 1),
    constant!(AURORA, "GRAVITY_FORCE_Y", int 2),
    constant!(AURORA, "GRAVITY_FORCE_Z", int 3),
];

/// A built-in constant visible under `flags`.
pub fn find_constant(name: &str, flags: AcceptedFlags) -> Option<&'static BuiltinConstant> {
    CONSTANTS.iter().find(|c| c.name == name && flags.accepts(c.flag))
}

// ── Functions ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BuiltinFn {
    pub name: &'static str,
    pub flag: AcceptedFlags,
}

macro_rules! functions {
    ($flag:ident: $($name:literal),* $(,)?) => {
        [$(BuiltinFn { name: $name, flag: AcceptedFlags::$flag }),*]
    };
}

static LSL_FUNCTIONS: &[BuiltinFn] = &functions![LSL:
    "llAbs", "llAcos", "llAddToLandBanList", "llAllowInventoryDrop", "llAngleBetween",
    "llApplyImpulse", "llAsin", "llAtan2", "llAttachToAvatar", "llAxes2Rot", "llAxisAngle2Rot",
    "llBase64ToString", "llBreakAllLinks", "llBreakLink", "llCSV2List", "llCeil",
    "llClearCameraParams", "llCloud", "llCollisionFilter", "llCos", "llCreateLink",
    "llDeleteSubList", "llDeleteSubString", "llDetachFromAvatar", "llDetectedKey",
    "llDetectedName", "llDetectedOwner", "llDetectedPos", "llDetectedRot", "llDetectedType",
    "llDetectedVel", "llDialog", "llDie", "llDumpList2String", "llEmail", "llEuler2Rot",
    "llFabs", "llFloor", "llFrand", "llGetAgentInfo", "llGetAgentSize", "llGetAlpha",
    "llGetAttached", "llGetColor", "llGetCreator", "llGetDate", "llGetFreeMemory",
    "llGetGMTclock", "llGetInventoryKey", "llGetInventoryName", "llGetInventoryNumber",
    "llGetInventoryType", "llGetKey", "llGetLinkKey", "llGetLinkName", "llGetLinkNumber",
    "llGetListEntryType", "llGetListLength", "llGetLocalPos", "llGetLocalRot", "llGetMass",
    "llGetNotecardLine", "llGetNumberOfPrims", "llGetObjectDesc", "llGetObjectDetails",
    "llGetObjectName", "llGetOwner", "llGetOwnerKey", "llGetPermissions",
    "llGetPermissionsKey", "llGetPos", "llGetPrimitiveParams", "llGetRegionName", "llGetRot",
    "llGetScale", "llGetScriptName", "llGetStartParameter", "llGetSubString", "llGetTime",
    "llGetTimestamp", "llGetUnixTime", "llGetVel", "llGetWallclock", "llGiveInventory",
    "llGiveMoney", "llHTTPRequest", "llHTTPResponse", "llInsertString", "llInstantMessage",
    "llIntegerToBase64", "llJson2List", "llJsonGetValue", "llJsonSetValue", "llKey2Name",
    "llList2CSV", "llList2Float", "llList2Integer", "llList2Json", "llList2Key", "llList2List",
    "llList2ListStrided", "llList2Rot", "llList2String", "llList2Vector", "llListFindList",
    "llListInsertList", "llListRandomize", "llListReplaceList", "llListSort", "llListen",
    "llListenControl", "llListenRemove", "llLoadURL", "llLog", "llLog10", "llLookAt",
    "llMD5String", "llMessageLinked", "llMoveToTarget", "llOwnerSay", "llParseString2List",
    "llParseStringKeepNulls", "llPlaySound", "llPow", "llRegionSay", "llRegionSayTo",
    "llReleaseControls", "llRemoteLoadScriptPin", "llRemoveInventory", "llRequestAgentData",
    "llRequestPermissions", "llRequestURL", "llResetScript", "llResetTime", "llRezAtRoot",
    "llRezObject", "llRot2Angle", "llRot2Axis", "llRot2Euler", "llRot2Fwd", "llRot2Left",
    "llRot2Up", "llRotBetween", "llRound", "llSameGroup", "llSay", "llSensor",
    "llSensorRemove", "llSensorRepeat", "llSetAlpha", "llSetColor", "llSetLinkAlpha",
    "llSetLinkColor", "llSetLinkPrimitiveParams", "llSetLinkPrimitiveParamsFast",
    "llSetLocalRot", "llSetObjectDesc", "llSetObjectName", "llSetPayPrice", "llSetPos",
    "llSetPrimitiveParams", "llSetRot", "llSetScale", "llSetScriptState", "llSetSitText",
    "llSetStatus", "llSetText", "llSetTexture", "llSetTimerEvent", "llSetTouchText",
    "llSetVehicleType", "llSHA1String", "llShout", "llSin", "llSitTarget", "llSleep",
    "llSqrt", "llStartAnimation", "llStopAnimation", "llStopSound", "llStringLength",
    "llStringToBase64", "llStringTrim", "llSubStringIndex", "llTakeControls", "llTan",
    "llTarget", "llTargetRemove", "llTeleportAgentHome", "llToLower", "llToUpper",
    "llTriggerSound", "llUnSit", "llUnescapeURL", "llEscapeURL", "llVecDist", "llVecMag",
    "llVecNorm", "llVolumeDetect", "llWater", "llWhisper", "llWind",
];

static OSSL_FUNCTIONS: &[BuiltinFn] = &functions![OSSL:
    "osAvatarName2Key", "osDrawText", "osForceAttachToAvatar", "osGetAgentIP", "osGetAgents",
    "osGetAvatarList", "osGetDrawStringSize", "osGetGridName", "osGetMapTexture",
    "osGetNotecard", "osGetNotecardLine", "osGetNumberOfNotecardLines", "osGetRegionStats",
    "osGetSimulatorVersion", "osIsNpc", "osKey2Name", "osList2Double", "osMakeNotecard",
    "osMessageObject", "osMovePen", "osNpcCreate", "osNpcMoveTo", "osNpcRemove", "osNpcSay",
    "osNpcSit", "osNpcStand", "osParseJSON", "osSetDynamicTextureData",
    "osSetDynamicTextureURL", "osSetPenColor", "osSetPenSize", "osSetSpeed",
    "osTeleportAgent", "osTeleportOwner", "osGetWindParam", "osSetWindParam",
];

static AURORA_FUNCTIONS: &[BuiltinFn] = &functions![AURORA:
    "aaCreateBot", "aaDeserializeXMLKeys", "aaDeserializeXMLValues", "aaFollowAvatar",
    "aaGetIsInfiniteRegion", "aaGetLastOwner", "aaGetTeam", "aaGetTeamMembers",
    "aaGetWalkDisabled", "aaJoinCombat", "aaJoinCombatTeam", "aaLeaveCombat",
    "aaRaiseError", "aaRequestCombatPermission", "aaSayDistance", "aaSayTo",
    "aaSerializeXML", "aaSetCharacterStat", "aaSetCloudDensity", "aaSetConeOfSilence",
    "aaStopFollowAvatar", "aaUpdatePrimProperties", "aaWindlightGetDayCycle",
    "botCreateBot", "botFollowAvatar", "botMoveTo", "botRemoveBot", "botSetMap",
];

static ADMIN_FUNCTIONS: &[BuiltinFn] = &functions![ADMIN:
    "aaSetEnv", "aaUpdateDatabase", "aaQueryDatabase", "osConsoleCommand", "osKickAvatar",
    "osRegionNotice", "osRegionRestart", "osSetParcelDetails", "osSetRegionWaterHeight",
    "osSetTerrainHeight",
];

fn all_functions() -> impl Iterator<Item = &'static BuiltinFn> {
    LSL_FUNCTIONS
        .iter()
        .chain(OSSL_FUNCTIONS)
        .chain(AURORA_FUNCTIONS)
        .chain(ADMIN_FUNCTIONS)
}

/// A built-in function visible under `flags`.
pub fn find_function(name: &str, flags: AcceptedFlags) -> Option<&'static BuiltinFn> {
    all_functions().find(|f| f.name == name && flags.accepts(f.flag))
}
