//! Fixed TypeScript fragments of the generated module.

macro_rules! client_library {
    () => {
        "@authzed/authzed-node"
    };
}

/// npm package the generated module imports the SpiceDB client types from.
pub const CLIENT_LIBRARY: &str = client_library!();

/// Import line naming [`CLIENT_LIBRARY`].
pub(crate) const IMPORT_HEADER: &str = concat!("import { v1 } from \"", client_library!(), "\";\n");

/// Opening of the resource type to permission mapping.
pub(crate) const PERMISSION_MAP_OPEN: &str = "type ResourcePermissionMap = {";

/// Closing of the resource type to permission mapping.
pub(crate) const PERMISSION_MAP_CLOSE: &str = "\n}\n";

/// Resource type names, derived from the mapping's keys.
pub(crate) const RESOURCE_TYPE_DECLARATION: &str =
    "type ResourceType = keyof ResourcePermissionMap;\n";

/// Fluent builder for `v1.CheckPermissionRequest`.
///
/// `withPermission` only accepts permissions of the resource type bound by
/// `to`, and `build` throws when subject, resource or permission is unset.
pub(crate) const PERMISSION_REQUEST_CLASS: &str = r#"export class PermissionRequest<S extends ResourceType, R extends ResourceType> {
  private subject?: v1.SubjectReference;
  private resource?: v1.ObjectReference;
  private permission?: ResourcePermissionMap[R];

  from(type: S, id: string): PermissionRequest<S, R> {
    this.subject = {
      object: {
        objectType: type,
        objectId: id
      }
    } as v1.SubjectReference;

    return this;
  }

  to(type: R, id: string): PermissionRequest<S, R> {
    this.resource = {
      objectType: type,
      objectId: id
    };
    return this;
  }

  withPermission(permission: ResourcePermissionMap[R]): PermissionRequest<S, R> {
    this.permission = permission;
    return this;
  }

  build(): v1.CheckPermissionRequest {
    if (!this.subject || !this.resource || !this.permission) {
      throw new Error('Incomplete permission request');
    }
    return v1.CheckPermissionRequest.create({
      resource: this.resource,
      permission: this.permission,
      subject: this.subject,
    })
  }
};"#;
