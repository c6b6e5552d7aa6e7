#![allow(dead_code)]

use query_predicate::Schema;

pub const SBOM_SCHEMA: &str = r#"{
    "entities": {
        "Sbom": {
            "fields": {
                "id": { "type": "string" },
                "buildId": { "type": "string" },
                "rootPurl": { "type": "string" },
                "creationTime": { "type": "date" },
                "size": { "type": "number" },
                "published": { "type": "boolean" },
                "generationRequest": { "type": "relation", "target": "GenerationRequest" }
            }
        },
        "GenerationRequest": {
            "fields": {
                "id": { "type": "string" },
                "identifier": { "type": "string" },
                "status": { "type": "enumeration", "name": "SbomGenerationStatus" },
                "result": { "type": "enumeration", "name": "GenerationResult" },
                "config": { "type": "relation", "target": "Config" }
            }
        },
        "Config": {
            "fields": {
                "product": { "type": "string" }
            }
        }
    },
    "enumerations": {
        "SbomGenerationStatus": {
            "members": ["NEW", "INITIALIZING", "INITIALIZED", "GENERATING", "FINISHED", "FAILED"],
            "aliases": { "in-progress": "GENERATING", "done": "FINISHED" }
        },
        "GenerationResult": {
            "members": ["SUCCESS", "ERR_GENERAL", "ERR_CONFIG_INVALID", "ERR_SYSTEM"]
        }
    }
}"#;

pub fn sbom_schema() -> Schema {
    Schema::from_json(SBOM_SCHEMA).unwrap()
}
