//! Sample spreadsheets used across integration tests.
#![allow(dead_code)]

/// Clients with messy headers and spacing; clean after normalization
pub const CLIENTS_CSV: &str = "\
Client ID,Client Name,Priority,Requested Tasks,Group,Attributes
C1,  Acme   Corp ,3,\"T1; T2\",GroupA,\"{ \"\"budget\"\": 100 }\"
C2,Globex,5,T2,GroupB,
C3,Initech,2.0,\"[\"\"T1\"\",\"\"T2\"\"]\",GroupA,{}
";

pub const WORKERS_CSV: &str = "\
WorkerID,WorkerName,Skills,AvailableSlots,MaxLoadPerPhase,WorkerGroup,QualificationLevel
W1,Ada,\"coding, testing\",[1,2,3],2,GroupA,3
W2,Grace,design,2-3,1,GroupB,2
";

pub const TASKS_CSV: &str = "\
TaskID,TaskName,Category,Duration,RequiredSkills,PreferredPhases,MaxConcurrent
T1,Build API,Dev,1,coding,1-2,1
T2,Mockups,Design,1,design,2-3,1
";

/// Tasks as a JSON export with a `data` wrapper
pub const TASKS_JSON: &str = r#"{"data": [
  {"TaskID": "T1", "TaskName": "Build API", "Category": "Dev", "Duration": 1,
   "RequiredSkills": "coding", "PreferredPhases": "1-2", "MaxConcurrent": 1},
  {"TaskID": "T2", "TaskName": "Mockups", "Category": "Design", "Duration": 1,
   "RequiredSkills": ["design"], "PreferredPhases": [2, 3], "MaxConcurrent": 1}
]}"#;
